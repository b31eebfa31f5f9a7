//! End-to-end scenarios driving crafted story files through the public
//! API with a scripted host.

mod common;

use common::{StoryBuilder, PARSE_BUFFER, PROPS, TEXT_BUFFER};
use zinnia::game::state::GameState;
use zinnia::host::{Screen, ScriptedHost};

fn run(data: Vec<u8>) -> (GameState, ScriptedHost) {
    let mut host = ScriptedHost::new();
    let mut state = GameState::new(data).unwrap();
    state.run(&mut host).unwrap();
    (state, host)
}

#[test]
fn arithmetic_routine_wraps_and_truncates() {
    let mut builder = StoryBuilder::new();
    // Locals: a = 5, b = -3. Store each result in a global, then
    // return the sum.
    let routine = builder.routine(
        0x900,
        &[5, (-3i16) as u16],
        &[
            0x74, 0x01, 0x02, 0x11, // add a b -> G17
            0x76, 0x01, 0x02, 0x12, // mul a b -> G18
            0x77, 0x01, 0x02, 0x13, // div a b -> G19
            0x78, 0x01, 0x02, 0x14, // mod a b -> G20
            0xAB, 0x11, // ret G17
        ],
    );
    builder.code(&[
        0xE0,
        0x3F,
        (routine >> 8) as u8,
        routine as u8,
        0x10, // call -> G16
        0xBA, // quit
    ]);

    let (state, _) = run(builder.build());
    assert_eq!(state.memory.get_global(16), 2);
    assert_eq!(state.memory.get_global(17), 2);
    assert_eq!(state.memory.get_global(18), (-15i16) as u16);
    assert_eq!(state.memory.get_global(19), (-1i16) as u16);
    assert_eq!(state.memory.get_global(20), 2);
}

#[test]
fn packed_string_prints_through_shifts_and_escapes() {
    let mut builder = StoryBuilder::new();
    // "Hello, World!\n" encoded by hand, with '!' forced through the
    // raw-ASCII escape.
    builder.bytes(
        0x900,
        &[
            0x11, 0xAA, // H e
            0x46, 0x34, // l l o
            0x16, 0x60, // , _
            0x13, 0x94, // W
            0x5E, 0x29, // o r l d
            0x14, 0xC1, // escape, high half of '!'
            0x84, 0xA7, // low half, newline
        ],
    );
    // A second string goes through the builder's own encoder, so the
    // shift handling is checked against independently produced bytes.
    let second = builder.string_at(0x920, "Z-Machine 42\n");
    builder.code(&[
        0x8D, 0x04, 0x80, // print_paddr the hand-packed string
        0x8D,
        (second >> 8) as u8,
        second as u8,
        0xBA,
    ]);

    let (_, host) = run(builder.build());
    assert_eq!(host.output, "Hello, World!\nZ-Machine 42\n");
}

#[test]
fn branch_offset_one_returns_from_routine() {
    let mut builder = StoryBuilder::new();
    // jz 0 with short branch offset 1: return true, don't jump.
    let routine = builder.routine(0x2704, &[], &[0x90, 0x00, 0xC1]);
    builder.code(&[
        0xE0,
        0x3F,
        (routine >> 8) as u8,
        routine as u8,
        0x10, // call -> G16
        0xBA,
    ]);

    let (state, _) = run(builder.build());
    assert_eq!(state.memory.get_global(16), 1);
}

#[test]
fn long_branch_with_sign_bit_jumps_backward() {
    let mut builder = StoryBuilder::new();
    // jz 0 with branch word 0xA001: offset 0x2001 - 0x4000 = -8191,
    // landing on the rfalse planted below the call site.
    let routine = builder.routine(0x2704, &[], &[0x90, 0x00, 0xA0, 0x01]);
    builder.code(&[
        0xE0,
        0x3F,
        (routine >> 8) as u8,
        routine as u8,
        0x10, // call -> G16
        0x8C, 0x00, 0x03, // jump over the landing pad
        0xB1, // rfalse: the branch target at 0x708
        0xBA,
    ]);

    let (state, _) = run(builder.build());
    assert_eq!(state.memory.get_global(16), 0);
}

#[test]
fn objects_move_and_detach() {
    let mut builder = StoryBuilder::new();
    // Tree: 1 { 2, 3 { 4 } }
    builder
        .object(1, 0, 0, 2)
        .object(2, 1, 3, 0)
        .object(3, 1, 0, 4)
        .object(4, 3, 0, 0)
        .code(&[
            0x0E, 0x04, 0x01, // insert_obj 4 1
            0x99, 0x02, // remove_obj 2
            0xBA,
        ]);

    let (state, _) = run(builder.build());
    assert_eq!(state.memory.object_child(1), 4);
    assert_eq!(state.memory.object_sibling(4), 3);
    assert_eq!(state.memory.object_parent(4), 1);
    assert_eq!(state.memory.object_child(3), 0);
    assert_eq!(state.memory.object_parent(2), 0);
    assert_eq!(state.memory.object_sibling(2), 0);
}

#[test]
fn save_then_restore_resumes_through_the_save_branch() {
    let mut builder = StoryBuilder::new();
    builder.code(&[
        0xB5, 0xC7, // save, branch to the success path
        0xE5, 0x7F, b'F', // print_char 'F'
        0xBA,
        0xB4, // nop pad
        0xE5, 0x7F, b'S', // 0x707: print_char 'S'
        0xB6, 0xC2, // restore; on failure fall through
        0xE5, 0x7F, b'E', // print_char 'E'
        0xBA,
    ]);

    // Save succeeds ('S'), restore resumes at the save branch ('S'
    // again), the second restore finds nothing and fails ('E').
    let (_, host) = run(builder.build());
    assert_eq!(host.output, "SSE");
}

#[test]
fn failed_save_takes_the_other_branch() {
    let mut builder = StoryBuilder::new();
    builder.code(&[
        0xB5, 0xC7,
        0xE5, 0x7F, b'F',
        0xBA,
        0xB4,
        0xE5, 0x7F, b'S',
        0xB6, 0xC2,
        0xE5, 0x7F, b'E',
        0xBA,
    ]);

    let mut host = ScriptedHost::new();
    host.save_succeeds = false;
    let mut state = GameState::new(builder.build()).unwrap();
    state.run(&mut host).unwrap();
    assert_eq!(host.output, "F");
}

#[test]
fn restore_rejects_data_from_another_release() {
    let mut builder = StoryBuilder::new();
    builder.code(&[
        0xB6, 0xC7, // restore, branch on success
        0xE5, 0x7F, b'F',
        0xBA,
        0xB4,
        0xE5, 0x7F, b'S',
        0xBA,
    ]);
    let data = builder.build();

    // A structurally valid save whose release bytes disagree.
    let donor = GameState::new(data.clone()).unwrap();
    let mut blob = donor.serialize();
    blob[2] ^= 0xFF;

    let mut host = ScriptedHost::new();
    host.saved = Some(blob);
    let mut state = GameState::new(data).unwrap();
    state.run(&mut host).unwrap();
    assert_eq!(host.output, "F");
}

#[test]
fn read_tokenizes_against_the_dictionary() {
    let mut builder = StoryBuilder::new();
    builder.dictionary(",.", &["take", "lamp"]);
    builder.set_byte(TEXT_BUFFER, 20);
    builder.set_byte(PARSE_BUFFER, 10);
    builder.code(&[
        0xE4,
        0x0F,
        (TEXT_BUFFER >> 8) as u8,
        TEXT_BUFFER as u8,
        (PARSE_BUFFER >> 8) as u8,
        PARSE_BUFFER as u8,
        0xBA,
    ]);
    let take = builder.dict_entry(0);
    let lamp = builder.dict_entry(1);

    let mut host = ScriptedHost::with_input(&["Take lamp, now."]);
    let mut state = GameState::new(builder.build()).unwrap();
    state.run(&mut host).unwrap();

    // The lowercased line lands in the text buffer, zero-terminated.
    let written: Vec<u8> = (0..16)
        .map(|i| state.memory.get_byte(TEXT_BUFFER + 1 + i))
        .collect();
    assert_eq!(&written[..15], b"take lamp, now.");
    assert_eq!(written[15], 0);

    assert_eq!(state.memory.get_byte(PARSE_BUFFER + 1), 5);
    let record = |k: usize| {
        let at = PARSE_BUFFER + 2 + 4 * k;
        (
            state.memory.get_word(at),
            state.memory.get_byte(at + 2),
            state.memory.get_byte(at + 3),
        )
    };
    assert_eq!(record(0), (take, 4, 1));
    assert_eq!(record(1), (lamp, 4, 6));
    assert_eq!(record(2), (0, 1, 10));
    assert_eq!(record(3), (0, 3, 12));
    assert_eq!(record(4), (0, 1, 15));
}

#[test]
fn status_line_reports_location_and_counters() {
    let mut builder = StoryBuilder::new();
    builder
        .object(1, 0, 0, 0)
        .prop_table(PROPS, 1, "den", &[])
        .global(16, 1)
        .global(17, 5)
        .global(18, 9)
        .code(&[0xBC, 0xBA]); // show_status, quit

    let mut host = ScriptedHost::new();
    host.with_status = true;
    let mut state = GameState::new(builder.build()).unwrap();
    state.run(&mut host).unwrap();
    assert_eq!(host.statuses, vec![("den".to_string(), 5, 9)]);
}

#[test]
fn split_screen_callouts_reach_a_capable_host() {
    let mut builder = StoryBuilder::new();
    builder.code(&[
        0xEA, 0x7F, 0x02, // split_window 2
        0xEB, 0x7F, 0x01, // set_window 1
        0xBA,
    ]);

    let mut host = ScriptedHost::new();
    host.with_split = true;
    let mut state = GameState::new(builder.build()).unwrap();
    state.run(&mut host).unwrap();
    assert_eq!(host.splits, vec![2]);
    assert_eq!(host.windows, vec![Screen::Upper]);

    // A host without a split screen never sees them.
    let mut builder = StoryBuilder::new();
    builder.code(&[0xEA, 0x7F, 0x02, 0xEB, 0x7F, 0x01, 0xBA]);
    let (_, host) = run(builder.build());
    assert!(host.splits.is_empty());
    assert!(host.windows.is_empty());
}

#[test]
fn restart_reinitializes_and_notifies_the_host() {
    let mut builder = StoryBuilder::new();
    builder.set_byte(TEXT_BUFFER, 20);
    builder.set_byte(PARSE_BUFFER, 10);
    builder.code(&[
        0xE4,
        0x0F,
        (TEXT_BUFFER >> 8) as u8,
        TEXT_BUFFER as u8,
        (PARSE_BUFFER >> 8) as u8,
        PARSE_BUFFER as u8, // sread
        0xD0,
        0x1F,
        (PARSE_BUFFER >> 8) as u8,
        (PARSE_BUFFER + 1) as u8,
        0x00,
        0x00, // loadb token count -> stack
        0xA0, 0x00, 0xC3, // jz: no tokens means we're done
        0xB7, // restart
        0xBA,
    ]);

    let mut host = ScriptedHost::with_input(&["go", ""]);
    let mut state = GameState::new(builder.build()).unwrap();
    state.run(&mut host).unwrap();
    // Once at boot, once for the restart instruction.
    assert_eq!(host.restarts, 2);
}

#[test]
fn verify_checks_the_original_image() {
    let code = [
        0xBD, 0xC6, // verify, branch over the failure path
        0xE5, 0x7F, b'N',
        0xBA,
        0xE5, 0x7F, b'Y', // 0x706
        0xBA,
    ];

    let mut builder = StoryBuilder::new();
    builder.code(&code);
    let (_, host) = run(builder.build());
    assert_eq!(host.output, "Y");

    let mut builder = StoryBuilder::new();
    builder.code(&code);
    let mut data = builder.build();
    data[0x7F0] ^= 0x55; // corrupt a byte the checksum covers
    let (_, host) = run(data);
    assert_eq!(host.output, "N");
}

#[test]
fn properties_read_as_bytes_words_and_defaults() {
    let mut builder = StoryBuilder::new();
    builder
        .object(1, 0, 0, 0)
        .prop_table(PROPS, 1, "box", &[(5, &[0xAB]), (4, &[0x12, 0x34])])
        .prop_default(3, 0x0BB8);
    let state = GameState::new(builder.build()).unwrap();
    let memory = &state.memory;

    let five = memory.property(1, 5).unwrap();
    assert_eq!(five.data_to_u16().unwrap(), 0xAB);
    assert_eq!(
        memory.get_byte(five.data_address as usize) as u16,
        0xAB
    );

    let four = memory.property(1, 4).unwrap();
    assert_eq!(four.data_to_u16().unwrap(), 0x1234);
    assert_eq!(memory.get_word(four.data_address as usize), 0x1234);

    assert!(memory.property(1, 3).is_none());
    assert_eq!(memory.default_property(3), 0x0BB8);

    // The next-property chain: 0 names the first, 0 ends it.
    assert_eq!(memory.property_iter(1).next().unwrap().number, 5);
    assert_eq!(memory.following_property(1, 5).unwrap().number, 4);
    assert!(memory.following_property(1, 4).is_none());
}

#[test]
fn save_blob_round_trips_mid_routine() {
    let mut builder = StoryBuilder::new();
    // A routine that parks values on the stack, then saves.
    let routine = builder.routine(
        0x900,
        &[0x1111],
        &[
            0xE8, 0x7F, 0x2A, // push 42
            0xB5, 0xC1, // save, branch offset 1: return true on success
            0xB1, // rfalse otherwise
        ],
    );
    builder.code(&[
        0xE0,
        0x3F,
        (routine >> 8) as u8,
        routine as u8,
        0x10,
        0xBA,
    ]);

    let (state, host) = run(builder.build());
    assert_eq!(state.memory.get_global(16), 1);
    let blob = host.saved.expect("the save callout stored a blob");

    // Installing the blob into a fresh machine resumes inside the
    // routine: the local, the pushed value and the frame are all back.
    let mut builder = StoryBuilder::new();
    builder.routine(0x900, &[0x1111], &[0xE8, 0x7F, 0x2A, 0xB5, 0xC1, 0xB1]);
    builder.code(&[0xE0, 0x3F, 0x04, 0x80, 0x10, 0xBA]);
    let mut fresh = GameState::new(builder.build()).unwrap();
    fresh.apply_save_blob(&blob).unwrap();
    assert_eq!(fresh.serialize(), blob);
}
