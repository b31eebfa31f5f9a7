use std::mem;

use anyhow::Result;
use log::{debug, info, warn};
use num_traits::FromPrimitive;

use crate::game::address;
use crate::game::dictionary::Dictionary;
use crate::game::error::GameError;
use crate::game::instruction::{
    Callout, Form, Instruction, InstructionSet, OpCode, Operand, OperandSet,
    Result as InstructionResult,
};
use crate::game::memory::Memory;
use crate::game::save;
use crate::game::stack::{CallStack, StackFrame};
use crate::host::{Host, Screen};

/// The multiplier and increment of the random number generator.
const RANDOM_MUL: u32 = 1_664_525;
const RANDOM_ADD: u32 = 1_013_904_223;

/// The entire state of the running machine: working memory, the data
/// and call stacks, the program counter and the random state. Execution
/// proceeds one instruction at a time; instructions that need the
/// outside world return a callout which the run loop delivers to the
/// host before carrying on.
pub struct GameState {
    pub memory: Memory,
    pub checksum_valid: bool,
    pub version: u8,
    /// Advertised to the game via the Tandy header bit. May be set
    /// before `run`.
    pub is_tandy: bool,
    story: Vec<u8>,
    instructions: InstructionSet,
    dictionary: Dictionary,
    call_stack: CallStack,
    stack: Vec<u16>,
    pc: usize,
    rng_state: u32,
    has_status: bool,
    has_split: bool,
}

impl GameState {
    pub fn new(data: Vec<u8>) -> Result<GameState, GameError> {
        if data.len() < 64 {
            return Err(GameError::InvalidFile);
        }
        let story = data.clone();
        let memory = Memory::new(data);
        memory.validate_header()?;
        let dictionary = Dictionary::parse(&memory)?;
        Ok(GameState {
            checksum_valid: memory.verify(),
            version: memory.version(),
            is_tandy: false,
            story,
            instructions: InstructionSet::new(),
            dictionary,
            call_stack: CallStack::new(),
            stack: Vec::new(),
            pc: 0,
            rng_state: rand::random(),
            has_status: false,
            has_split: false,
            memory,
        })
    }

    /// The story's release identifier, matched against save data.
    pub fn release_number(&self) -> u16 {
        self.memory.release_number()
    }

    pub fn serial_number(&self) -> String {
        self.memory.serial_number()
    }

    /// Whether the status line shows hours and minutes rather than
    /// score and moves.
    pub fn status_time(&self) -> bool {
        self.story[address::FLAGS_1] & address::FLAG_STATUS_TIME != 0
    }

    /// The interpreter's own version: major, minor, subminor and build
    /// timestamp. Not to be confused with the story file's `version`.
    pub fn interpreter_version(&self) -> crate::Version {
        crate::Version::current()
    }

    /// Run the story against the given host until it quits.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<()> {
        self.has_status = host.has_status();
        self.has_split = host.has_split();
        let flags = self.memory.get_word(address::FLAGS_2);
        self.init(flags);
        host.restarted()?;
        let mut fixed_pitch = self.fixed_pitch();
        host.highlight(fixed_pitch)?;

        loop {
            let result = self.execute_next()?;
            if self.perform(result, host, &mut fixed_pitch)? {
                break;
            }
        }
        info!("Game ended normally");
        Ok(())
    }

    /// Reset memory and continuation for a fresh start, installing the
    /// given shadow flags word and advertising the interpreter's
    /// capabilities in the mode byte.
    fn init(&mut self, flags: u16) {
        self.memory.reset(&self.story);

        let mut mode = self.memory.get_byte(address::FLAGS_1)
            & (address::FLAG_BYTE_SWAPPED | address::FLAG_STATUS_TIME);
        if self.is_tandy {
            mode |= address::FLAG_TANDY;
        }
        if !self.has_status {
            mode |= address::FLAG_NO_STATUS_LINE;
        }
        if self.has_split {
            mode |= address::FLAG_SPLIT_AVAILABLE;
        }
        self.memory.set_byte(address::FLAGS_1, mode);
        self.memory.set_word(address::FLAGS_2, flags);

        self.call_stack = CallStack::new();
        self.stack.clear();
        self.pc = self.memory.program_counter_starts() as usize;
    }

    fn scripting(&self) -> bool {
        self.memory.get_word(address::FLAGS_2) & address::FLAG_TRANSCRIPTING != 0
    }

    fn fixed_pitch(&self) -> bool {
        self.memory.get_word(address::FLAGS_2) & address::FLAG_FIXED_PITCH != 0
    }

    /// Decode and dispatch the instruction at the program counter.
    fn execute_next(&mut self) -> Result<InstructionResult> {
        let instruction_pc = self.pc;
        let mut cursor = self.pc;
        let op_byte = self.memory.read_byte(&mut cursor);

        let form = match op_byte {
            0x00..=0x7F => Form::Long,
            0x80..=0xBF => Form::Short,
            _ => Form::Variable,
        };

        let mut raw_operands = Vec::new();
        let opcode = match form {
            Form::Long => {
                raw_operands
                    .push(self.memory.read_operand_long(&mut cursor, (op_byte >> 6) & 1));
                raw_operands
                    .push(self.memory.read_operand_long(&mut cursor, (op_byte >> 5) & 1));
                OpCode::TwoOp(op_byte & 0x1F)
            }
            Form::Short => {
                let op_type = (op_byte >> 4) & 3;
                if op_type == 3 {
                    OpCode::ZeroOp(op_byte & 0xF)
                } else {
                    raw_operands.push(self.memory.read_operand_other(&mut cursor, op_type));
                    OpCode::OneOp(op_byte & 0xF)
                }
            }
            Form::Variable => {
                let types = self.memory.read_byte(&mut cursor);
                for index in 0..4 {
                    let op_type = (types >> (6 - 2 * index)) & 3;
                    match self.memory.read_operand_other(&mut cursor, op_type) {
                        Operand::Omitted => break,
                        operand => raw_operands.push(operand),
                    }
                }
                if op_byte & 0x20 != 0 {
                    OpCode::VarOp(op_byte & 0x1F)
                } else {
                    OpCode::TwoOp(op_byte & 0x1F)
                }
            }
        };
        self.pc = cursor;

        let instruction = self
            .instructions
            .get(&opcode)
            .ok_or_else(|| GameError::InvalidOpcode(opcode.to_string()))?;

        let mut values = Vec::with_capacity(raw_operands.len());
        for operand in &raw_operands {
            values.push(self.resolve_operand(operand)?);
        }
        let ops = OperandSet::new(values);

        debug!("{:#06x}: {} {}", instruction_pc, instruction.name(), ops);

        match instruction {
            Instruction::Normal(f, _) => f(self, ops),
            Instruction::StringLiteral(f, _) => {
                let (text, end) = self.memory.extract_string(self.pc)?;
                self.pc = end;
                f(self, text)
            }
        }
    }

    /// Act on one instruction's result. Returns whether the game is
    /// over.
    fn perform(
        &mut self,
        result: InstructionResult,
        host: &mut dyn Host,
        fixed_pitch: &mut bool,
    ) -> Result<bool> {
        match result {
            InstructionResult::Continue => Ok(false),
            InstructionResult::Return(value) => {
                self.do_return(value)?;
                Ok(false)
            }
            InstructionResult::Invoke { address, arguments } => {
                self.call_routine(address, arguments)?;
                Ok(false)
            }
            InstructionResult::Quit => Ok(true),
            InstructionResult::Suspend(callout) => self.deliver(callout, host, fixed_pitch),
        }
    }

    /// Hand a callout to the host, then finish whatever the instruction
    /// left undone (branching on the host's answer, tokenizing input).
    fn deliver(
        &mut self,
        callout: Callout,
        host: &mut dyn Host,
        fixed_pitch: &mut bool,
    ) -> Result<bool> {
        match callout {
            Callout::Print(text) => {
                self.deliver_print(&text, host, fixed_pitch)?;
                Ok(false)
            }
            Callout::PrintRet(text) => {
                self.deliver_print(&format!("{}\n", text), host, fixed_pitch)?;
                self.do_return(1)?;
                Ok(false)
            }
            Callout::Read { text, parse } => {
                // An empty print first, so pending highlight changes
                // reach the host before it starts editing a line.
                self.deliver_print("", host, fixed_pitch)?;
                if self.has_status {
                    self.deliver_status(host)?;
                }
                let max_len = self.memory.get_byte(text as usize) as usize;
                let line = host.read(max_len)?;
                self.handle_input(&line, text, parse);
                Ok(false)
            }
            Callout::Save => {
                let data = self.serialize();
                let success = host.save(&data)?;
                let after = self.branch_on(success)?;
                self.perform(after, host, fixed_pitch)
            }
            Callout::Restore => {
                // The shadow flags reflect the live session, not the
                // saved one.
                let flags = self.memory.get_word(address::FLAGS_2);
                let success = match host.restore()? {
                    Some(data) => match self.apply_save_blob(&data) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("{}", e);
                            false
                        }
                    },
                    None => false,
                };
                self.memory.set_word(address::FLAGS_2, flags);
                let after = self.branch_on(success)?;
                self.perform(after, host, fixed_pitch)
            }
            Callout::Restart => {
                let flags = self.memory.get_word(address::FLAGS_2);
                self.init(flags);
                host.restarted()?;
                Ok(false)
            }
            Callout::Status => {
                if self.has_status {
                    self.deliver_status(host)?;
                }
                Ok(false)
            }
            Callout::Verify => {
                let success = host.verify(self.checksum_valid);
                let after = self.branch_on(success)?;
                self.perform(after, host, fixed_pitch)
            }
            Callout::Split(height) => {
                if self.has_split {
                    host.split(height)?;
                }
                Ok(false)
            }
            Callout::Screen(window) => {
                if self.has_split {
                    match Screen::from_u16(window) {
                        Some(window) => host.screen(window)?,
                        None => warn!("@set_window called with window {}", window),
                    }
                }
                Ok(false)
            }
        }
    }

    /// Text reaches the host in program order; a font change slips in
    /// ahead of the first print after the flag flips.
    fn deliver_print(
        &mut self,
        text: &str,
        host: &mut dyn Host,
        fixed_pitch: &mut bool,
    ) -> Result<()> {
        let current = self.fixed_pitch();
        if current != *fixed_pitch {
            host.highlight(current)?;
            *fixed_pitch = current;
        }
        host.print(text, self.scripting())
    }

    fn deliver_status(&mut self, host: &mut dyn Host) -> Result<()> {
        let location = match self.memory.get_global(16) {
            0 => String::new(),
            object => self.memory.object_short_name(object)?,
        };
        host.status(
            &location,
            self.memory.get_global(17),
            self.memory.get_global(18),
        )
    }

    fn resolve_operand(&mut self, operand: &Operand) -> Result<u16> {
        match operand {
            Operand::LargeConstant(v) => Ok(*v),
            Operand::SmallConstant(v) => Ok((*v).into()),
            Operand::Variable(v) => self.get_variable(*v),
            Operand::Omitted => unreachable!(),
        }
    }

    fn next_code_byte(&mut self) -> u8 {
        let byte = self.memory.get_byte(self.pc);
        self.pc += 1;
        byte
    }

    /// Read a variable; variable 0 pops the data stack.
    pub fn get_variable(&mut self, variable: u8) -> Result<u16> {
        match variable {
            0 => self.pop_stack(),
            1..=15 => Ok(self.call_stack.frame().get_local(variable as usize - 1)),
            _ => Ok(self.memory.get_global(variable)),
        }
    }

    /// Write a variable; variable 0 pushes onto the data stack.
    pub fn set_variable(&mut self, variable: u8, value: u16) {
        match variable {
            0 => self.push_stack(value),
            1..=15 => self
                .call_stack
                .frame()
                .set_local(variable as usize - 1, value),
            _ => self.memory.set_global(variable, value),
        }
    }

    /// Read a variable without popping: variable 0 peeks the stack top.
    pub fn peek_variable(&mut self, variable: u8) -> Result<u16> {
        match variable {
            0 => self
                .stack
                .last()
                .copied()
                .ok_or_else(|| GameError::EmptyStack.into()),
            _ => self.get_variable(variable),
        }
    }

    /// Write a variable without pushing: variable 0 overwrites the
    /// stack top.
    pub fn poke_variable(&mut self, variable: u8, value: u16) -> Result<()> {
        match variable {
            0 => {
                *self
                    .stack
                    .last_mut()
                    .ok_or(GameError::EmptyStack)? = value;
            }
            _ => self.set_variable(variable, value),
        }
        Ok(())
    }

    pub fn push_stack(&mut self, value: u16) {
        self.stack.push(value);
    }

    pub fn pop_stack(&mut self) -> Result<u16> {
        self.stack
            .pop()
            .ok_or_else(|| GameError::EmptyStack.into())
    }

    /// Consume the store byte following the operands and write the
    /// instruction's result through it.
    pub fn store_result(&mut self, value: u16) -> Result<()> {
        let destination = self.next_code_byte();
        self.set_variable(destination, value);
        Ok(())
    }

    /// Consume the branch specifier following the operands and act on
    /// it. Offsets 0 and 1 return from the routine instead of jumping.
    pub fn branch_on(&mut self, condition: bool) -> Result<InstructionResult> {
        let first = self.next_code_byte();
        let expected = first & 0x80 != 0;
        let offset = if first & 0x40 != 0 {
            (first & 0x3F) as i32
        } else {
            let second = self.next_code_byte();
            let mut offset = (((first & 0x3F) as i32) << 8) | second as i32;
            if offset & 0x2000 != 0 {
                offset -= 0x4000;
            }
            offset
        };

        if condition != expected {
            return Ok(InstructionResult::Continue);
        }
        match offset {
            0 => Ok(InstructionResult::Return(0)),
            1 => Ok(InstructionResult::Return(1)),
            _ => {
                self.pc = (self.pc as i64 + offset as i64 - 2) as usize;
                Ok(InstructionResult::Continue)
            }
        }
    }

    /// Move the program counter by a signed offset, as JUMP does.
    pub fn jump_relative(&mut self, offset: i16) {
        self.pc = (self.pc as i64 + offset as i64 - 2) as usize;
    }

    /// Enter a routine at a packed address. The caller's data stack is
    /// parked in the new frame and the store byte stays unread at the
    /// call site until the routine returns. Address 0 just stores
    /// false.
    fn call_routine(&mut self, address: u16, arguments: Vec<u16>) -> Result<()> {
        if address == 0 {
            let destination = self.next_code_byte();
            self.set_variable(destination, 0);
            return Ok(());
        }

        let mut cursor = self.memory.unpack_address(address as usize);
        let count = self.memory.read_byte(&mut cursor) as usize;
        if count > 15 {
            return Err(
                GameError::InvalidOperation("Routine has more than 15 locals".into()).into(),
            );
        }
        let mut locals = Vec::with_capacity(count);
        for _ in 0..count {
            locals.push(self.memory.read_word(&mut cursor));
        }
        for (index, argument) in arguments.iter().take(count).enumerate() {
            locals[index] = *argument;
        }

        self.call_stack
            .push(StackFrame::new(self.pc, mem::take(&mut self.stack), locals));
        self.pc = cursor;
        Ok(())
    }

    /// Leave the current routine: restore the caller's stack, then read
    /// the store byte waiting at the call site and write the value
    /// through it.
    fn do_return(&mut self, value: u16) -> Result<()> {
        let frame = self.call_stack.pop()?;
        self.stack = frame.saved_stack;
        self.pc = frame.return_pc;
        let destination = self.next_code_byte();
        self.set_variable(destination, value);
        Ok(())
    }

    /// Capture the continuation for a save.
    pub fn serialize(&self) -> Vec<u8> {
        save::serialize(&self.memory, self.pc, &self.stack, self.call_stack.frames())
    }

    /// Validate and install saved state. Memory outside the dynamic
    /// prefix is untouched; on any error the machine is unchanged.
    pub fn apply_save_blob(&mut self, data: &[u8]) -> Result<(), GameError> {
        let continuation = save::deserialize(data, &self.memory)?;
        self.memory.set_bytes(0, &continuation.dynamic_memory);
        self.pc = continuation.pc;
        self.stack = continuation.stack;
        self.call_stack.replace(continuation.frames);
        Ok(())
    }

    /// Store a line of player input: lowercased, truncated text in the
    /// text buffer, then one record per token in the parse buffer
    /// holding the dictionary address, length and 1-based position.
    pub fn handle_input(&mut self, line: &str, text: u16, parse: u16) {
        let line = line.to_lowercase();
        let capacity = self.memory.get_byte(text as usize) as usize;
        let line: String = line.chars().take(capacity.saturating_sub(1)).collect();

        let mut cursor = text as usize + 1;
        for c in line.chars() {
            self.memory.write_byte(&mut cursor, c as u8);
        }
        self.memory.write_byte(&mut cursor, 0);

        let tokens = self.dictionary.tokenize(&line);
        self.memory
            .set_byte(parse as usize + 1, tokens.len() as u8);
        for (index, token) in tokens.iter().enumerate() {
            let mut record = parse as usize + 2 + 4 * index;
            let address = self.dictionary.lookup(token.text);
            self.memory.write_word(&mut record, address);
            self.memory.write_byte(&mut record, token.text.len() as u8);
            self.memory.write_byte(&mut record, token.position as u8);
        }
    }

    pub fn seed_random(&mut self, seed: u32) {
        self.rng_state = seed;
    }

    /// Advance the generator and scale its state into 1..=range.
    pub fn next_random(&mut self, range: u16) -> u16 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RANDOM_MUL)
            .wrapping_add(RANDOM_ADD);
        ((self.rng_state as u64 * range as u64) >> 32) as u16 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    /// A minimal but structurally valid story: header, globals at
    /// 0x100, object table at 0x200, dynamic memory ending at 0x500,
    /// code at 0x700.
    fn story_with_code(code: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 0x800];
        data[address::VERSION] = 3;
        data[address::RELEASE_NUMBER + 1] = 0x42;
        data[address::PROGRAM_COUNTER_STARTS] = 0x07;
        data[address::OBJECT_TABLE_LOCATION] = 0x02;
        data[address::GLOBAL_VARIABLE_TABLE_LOCATION] = 0x01;
        data[address::STATIC_MEMORY_BASE] = 0x05;
        data[address::FILE_LENGTH] = 0x04;
        data[0x700..0x700 + code.len()].copy_from_slice(code);
        data
    }

    #[test]
    fn calling_address_zero_stores_false_and_leaves_stacks_alone() {
        // call 0 -> G16; quit
        let code = [0xE0, 0x3F, 0x00, 0x00, 0x10, 0xBA];
        let mut data = story_with_code(&code);
        // Give the result variable a value that must be overwritten.
        data[0x100] = 0x12;
        data[0x101] = 0x34;
        let mut state = GameState::new(data).unwrap();
        let mut host = ScriptedHost::new();
        state.run(&mut host).unwrap();
        assert_eq!(state.memory.get_global(16), 0);
        assert!(state.stack.is_empty());
        assert_eq!(state.call_stack.depth(), 1);
    }

    #[test]
    fn variables_peek_and_poke_without_popping() {
        let mut state = GameState::new(story_with_code(&[0xBA])).unwrap();
        state.poke_variable(17, 0xBEEF).unwrap();
        assert_eq!(state.peek_variable(17).unwrap(), 0xBEEF);
        assert_eq!(state.get_variable(17).unwrap(), 0xBEEF);

        state.push_stack(1);
        state.push_stack(2);
        state.poke_variable(0, 7).unwrap();
        assert_eq!(state.peek_variable(0).unwrap(), 7);
        assert_eq!(state.get_variable(0).unwrap(), 7);
        assert_eq!(state.get_variable(0).unwrap(), 1);
        assert!(state.get_variable(0).is_err());
    }

    #[test]
    fn random_is_deterministic_after_seeding() {
        let mut state = GameState::new(story_with_code(&[0xBA])).unwrap();
        state.seed_random(0xFFFF);
        assert_eq!(state.next_random(100), 64);
        state.seed_random(0xFFFF);
        let mut values = Vec::new();
        for _ in 0..20 {
            let value = state.next_random(6);
            assert!((1..=6).contains(&value));
            values.push(value);
        }
        state.seed_random(0xFFFF);
        let again: Vec<u16> = (0..20).map(|_| state.next_random(6)).collect();
        assert_eq!(values, again);
    }

    #[test]
    fn interpreter_version_matches_the_crate() {
        let state = GameState::new(story_with_code(&[0xBA])).unwrap();
        let version = state.interpreter_version();
        assert_eq!(
            format!("{}.{}.{}", version.major, version.minor, version.subminor),
            crate::VERSION
        );
    }

    #[test]
    fn mode_byte_advertises_capabilities() {
        let mut state = GameState::new(story_with_code(&[0xBA])).unwrap();
        state.is_tandy = true;
        let mut host = ScriptedHost::new();
        host.with_status = true;
        host.with_split = true;
        state.run(&mut host).unwrap();
        let mode = state.memory.get_byte(address::FLAGS_1);
        assert_ne!(mode & address::FLAG_TANDY, 0);
        assert_eq!(mode & address::FLAG_NO_STATUS_LINE, 0);
        assert_ne!(mode & address::FLAG_SPLIT_AVAILABLE, 0);
        assert_eq!(host.restarts, 1);
        assert_eq!(host.highlights, vec![false]);
    }
}
