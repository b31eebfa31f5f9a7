use std::cmp::Ordering;
use std::convert::TryInto;

use anyhow::Result;
use log::warn;

use crate::game::error::GameError;
use crate::game::instruction::{
    Callout, OperandSet,
    Result::{self as InstructionResult, *},
};
use crate::game::state::GameState;

/// 2OP:1 Branch if the first operand is equal to any subsequent operand.
pub fn je(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let mut condition = false;
    for value in ops {
        if value as i16 == first {
            condition = true;
            break;
        }
    }

    state.branch_on(condition)
}

/// 2OP:2 Jump if a < b (signed).
pub fn jl(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let a = ops.pull_signed()?;
    let b = ops.pull_signed()?;

    state.branch_on(a < b)
}

/// 2OP:3 Jump if a > b (signed).
pub fn jg(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let a = ops.pull_signed()?;
    let b = ops.pull_signed()?;

    state.branch_on(a > b)
}

/// 2OP:4 Decrement the variable and branch if it is now less than the
/// given value. The variable is peeked, not popped.
pub fn dec_chk(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable_id: u8 = ops.pull()?.try_into()?;
    let comparand = ops.pull_signed()?;
    let value = (state.peek_variable(variable_id)? as i16).wrapping_sub(1);

    state.poke_variable(variable_id, value as u16)?;

    state.branch_on(value < comparand)
}

/// 2OP:5 Increment the variable and branch if it is now greater than the
/// given value.
pub fn inc_chk(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable_id: u8 = ops.pull()?.try_into()?;
    let comparand = ops.pull_signed()?;
    let value = (state.peek_variable(variable_id)? as i16).wrapping_add(1);

    state.poke_variable(variable_id, value as u16)?;

    state.branch_on(value > comparand)
}

/// 2OP:6 Jump if object a's parent is object b.
pub fn jin(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object_a = ops.pull()?;
    let object_b = ops.pull()?;
    let parent = if object_a == 0 {
        warn!("@jin called with object 0");
        0
    } else {
        state.memory.object_parent(object_a)
    };

    state.branch_on(object_b == parent)
}

/// 2OP:7 Jump if `bitmap & flags == flags`.
pub fn test(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let bitmap = ops.pull()?;
    let flags = ops.pull()?;

    state.branch_on(bitmap & flags == flags)
}

/// 2OP:8 Bitwise OR.
pub fn or(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let x = ops.pull()?;
    let y = ops.pull()?;

    state.store_result(x | y)?;

    Ok(Continue)
}

/// 2OP:9 Bitwise AND.
pub fn and(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let x = ops.pull()?;
    let y = ops.pull()?;

    state.store_result(x & y)?;

    Ok(Continue)
}

/// 2OP:10 Jump if the object has the given attribute.
pub fn test_attr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let attribute = ops.pull()?;
    let flag_set = if object == 0 {
        warn!("@test_attr called with object 0");
        false
    } else {
        state.memory.object_attribute(object, attribute)
    };

    state.branch_on(flag_set)
}

/// 2OP:11 Set the attribute on the provided object to true.
pub fn set_attr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let attribute = ops.pull()?;
    if object == 0 {
        warn!("@set_attr called on object 0");
    } else {
        state.memory.update_object_attribute(object, attribute, true);
    }

    Ok(Continue)
}

/// 2OP:12 Set the attribute on the provided object to false.
pub fn clear_attr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let attribute = ops.pull()?;
    if object == 0 {
        warn!("@clear_attr called on object 0");
    } else {
        state
            .memory
            .update_object_attribute(object, attribute, false);
    }

    Ok(Continue)
}

/// 2OP:13 Set the variable referenced by the operand to value, without
/// disturbing the stack.
pub fn store(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable = ops.pull()?;
    let value = ops.pull()?;

    state.poke_variable(variable.try_into()?, value)?;

    Ok(Continue)
}

/// 2OP:14 Move object to be the first child of the destination object.
pub fn insert_obj(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let destination = ops.pull()?;
    if object == 0 || destination == 0 {
        warn!("@insert_obj called with object 0");
        return Ok(Continue);
    }

    state.memory.move_object(object, destination);

    Ok(Continue)
}

/// 2OP:15 Store the word found at the given array and word index.
pub fn loadw(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let array = ops.pull()?;
    let word_index = ops.pull()?;
    let address = array.wrapping_add(word_index.wrapping_mul(2));
    let word = state.memory.get_word(address as usize);

    state.store_result(word)?;

    Ok(Continue)
}

/// 2OP:16 Store the byte found at the given array and byte index.
pub fn loadb(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let array = ops.pull()?;
    let byte_index = ops.pull()?;
    let address = array.wrapping_add(byte_index);
    let byte = state.memory.get_byte(address as usize);

    state.store_result(byte as u16)?;

    Ok(Continue)
}

/// 2OP:17 Return the data of the specified property, or its default
/// when the object lacks it.
pub fn get_prop(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let property = ops.pull()?;

    let data = if object == 0 {
        warn!("@get_prop called with object 0");
        0
    } else {
        state
            .memory
            .property(object, property)
            .map(|prop| prop.data_to_u16())
            .transpose()?
            .unwrap_or_else(|| state.memory.default_property(property))
    };

    state.store_result(data)?;

    Ok(Continue)
}

/// 2OP:18 Return the byte address of the specified property data.
pub fn get_prop_addr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let property = ops.pull()?;

    let address = if object == 0 {
        warn!("@get_prop_addr called with object 0");
        0
    } else {
        state
            .memory
            .property(object, property)
            .map(|prop| prop.data_address)
            .unwrap_or(0)
    };

    state.store_result(address)?;

    Ok(Continue)
}

/// 2OP:19 Get the number of the property after the provided one, or the
/// first property's number when given 0.
pub fn get_next_prop(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;

    if object == 0 {
        warn!("@get_next_prop called with object 0");
        state.store_result(0)?;
        return Ok(Continue);
    }

    let property = ops.pull()?;

    let next_prop = if property == 0 {
        state.memory.property_iter(object).next()
    } else {
        state.memory.following_property(object, property)
    };

    state.store_result(next_prop.map(|p| p.number).unwrap_or(0))?;

    Ok(Continue)
}

/// 2OP:20 Signed 16-bit addition.
pub fn add(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let second = ops.pull_signed()?;

    state.store_result(first.wrapping_add(second) as u16)?;

    Ok(Continue)
}

/// 2OP:21 Signed 16-bit subtraction.
pub fn sub(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let second = ops.pull_signed()?;

    state.store_result(first.wrapping_sub(second) as u16)?;

    Ok(Continue)
}

/// 2OP:22 Signed 16-bit multiplication, keeping the low word.
pub fn mul(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let second = ops.pull_signed()?;

    state.store_result(first.wrapping_mul(second) as u16)?;

    Ok(Continue)
}

/// 2OP:23 Signed 16-bit division, truncating toward zero.
pub fn div(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let second = ops.pull_signed()?;

    if second == 0 {
        return Err(GameError::InvalidOperation("Tried to divide by zero".into()).into());
    }

    state.store_result(first.wrapping_div(second) as u16)?;

    Ok(Continue)
}

/// 2OP:24 Signed 16-bit modulo, taking the sign of the dividend.
pub fn z_mod(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let first = ops.pull_signed()?;
    let second = ops.pull_signed()?;

    if second == 0 {
        return Err(GameError::InvalidOperation("Tried to divide by zero".into()).into());
    }

    state.store_result(first.wrapping_rem(second) as u16)?;

    Ok(Continue)
}

/// 1OP:128 Jump if the argument equals zero.
pub fn jz(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let a = ops.pull()?;

    state.branch_on(a == 0)
}

/// 1OP:129 Store the object's sibling and branch if it exists.
pub fn get_sibling(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let result = if object == 0 {
        warn!("@get_sibling called with object 0");
        0
    } else {
        state.memory.object_sibling(object)
    };

    state.store_result(result)?;

    state.branch_on(result != 0)
}

/// 1OP:130 Store the object's child and branch if it exists.
pub fn get_child(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let result = if object == 0 {
        warn!("@get_child called with object 0");
        0
    } else {
        state.memory.object_child(object)
    };

    state.store_result(result)?;

    state.branch_on(result != 0)
}

/// 1OP:131 Store the object's parent.
pub fn get_parent(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;

    let result = if object == 0 {
        warn!("@get_parent called with object 0");
        0
    } else {
        state.memory.object_parent(object)
    };

    state.store_result(result)?;

    Ok(Continue)
}

/// 1OP:132 Get the length of the property whose data lives at the
/// provided address.
pub fn get_prop_len(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let address = ops.pull()?;

    let result = if address == 0 {
        0
    } else {
        state.memory.property_data_length(address as usize)
    };

    state.store_result(result)?;

    Ok(Continue)
}

/// 1OP:133 Increment the provided variable.
pub fn inc(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable_id: u8 = ops.pull()?.try_into()?;
    let value = state.peek_variable(variable_id)? as i16;

    state.poke_variable(variable_id, value.wrapping_add(1) as u16)?;

    Ok(Continue)
}

/// 1OP:134 Decrement the provided variable.
pub fn dec(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable_id: u8 = ops.pull()?.try_into()?;
    let value = state.peek_variable(variable_id)? as i16;

    state.poke_variable(variable_id, value.wrapping_sub(1) as u16)?;

    Ok(Continue)
}

/// 1OP:135 Print the string stored at a byte address.
pub fn print_addr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let address = ops.pull()? as usize;
    let (text, _) = state.memory.extract_string(address)?;

    Ok(Suspend(Callout::Print(text)))
}

/// 1OP:137 Detach an object from its parent and siblings.
pub fn remove_obj(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    if object == 0 {
        warn!("@remove_obj called with object 0");
    } else {
        state.memory.move_object(object, 0);
    }

    Ok(Continue)
}

/// 1OP:138 Print the short name of the given object.
pub fn print_obj(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    if object == 0 {
        warn!("@print_obj called with object 0");
        return Ok(Continue);
    }

    let name = state.memory.object_short_name(object)?;

    Ok(Suspend(Callout::Print(name)))
}

/// 1OP:139 Return from the current routine with the given value.
pub fn ret(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    Ok(Return(ops.pull()?))
}

/// 1OP:140 Jump unconditionally. The operand is a signed offset, not a
/// packed address.
pub fn jump(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let offset = ops.pull_signed()?;

    state.jump_relative(offset);

    Ok(Continue)
}

/// 1OP:141 Print the string stored at a packed address.
pub fn print_paddr(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let address = ops.pull()?;
    let address = state.memory.unpack_address(address as usize);
    let (text, _) = state.memory.extract_string(address)?;

    Ok(Suspend(Callout::Print(text)))
}

/// 1OP:142 Load the variable referred to by the operand into the
/// result, leaving the stack alone.
pub fn load(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable_id: u8 = ops.pull()?.try_into()?;
    let value = state.peek_variable(variable_id)?;

    state.store_result(value)?;

    Ok(Continue)
}

/// 1OP:143 Bitwise NOT.
pub fn not(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let op = ops.pull()?;

    state.store_result(!op)?;

    Ok(Continue)
}

/// 0OP:176 Returns true (1).
pub fn rtrue(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Return(1))
}

/// 0OP:177 Returns false (0).
pub fn rfalse(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Return(0))
}

/// 0OP:178 Print a string stored immediately after the instruction.
pub fn print(_: &mut GameState, string: String) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Print(string)))
}

/// 0OP:179 Print a literal string followed by a newline, then return
/// true from the current routine.
pub fn print_ret(_: &mut GameState, string: String) -> Result<InstructionResult> {
    Ok(Suspend(Callout::PrintRet(string)))
}

/// 0OP:180 Does nothing.
pub fn nop(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Continue)
}

/// 0OP:181 Offer the serialized continuation to the host, branching on
/// success. The branch specifier is consumed by the driver, so a later
/// restore resumes right here and takes the same branch.
pub fn save(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Save))
}

/// 0OP:182 Ask the host for saved data, branching on success.
pub fn restore(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Restore))
}

/// 0OP:183 Start the story over from the beginning.
pub fn restart(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Restart))
}

/// 0OP:184 Return the top of the stack.
pub fn ret_popped(
    state: &mut GameState,
    _: OperandSet,
) -> Result<InstructionResult> {
    Ok(Return(state.pop_stack()?))
}

/// 0OP:185 Throw away the top of the stack.
pub fn pop(state: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    state.pop_stack()?;

    Ok(Continue)
}

/// 0OP:186 Exit the game.
pub fn quit(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Quit)
}

/// 0OP:187 Print a newline.
pub fn new_line(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Print("\n".into())))
}

/// 0OP:188 Redraw the status line.
pub fn show_status(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Status))
}

/// 0OP:189 Verify the file's checksum.
pub fn verify(_: &mut GameState, _: OperandSet) -> Result<InstructionResult> {
    Ok(Suspend(Callout::Verify))
}

/// VAR:224 Call a routine with up to 3 arguments and store the result.
/// Calling address 0 stores false and does nothing else.
pub fn call(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let address = ops.pull()?;
    let arguments: Vec<u16> = ops.collect();

    Ok(Invoke { address, arguments })
}

/// VAR:225 Store a word in the given array and word index.
pub fn storew(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let array = ops.pull()?;
    let word_index = ops.pull()?;
    let value = ops.pull()?;
    let address = array.wrapping_add(word_index.wrapping_mul(2));

    state.memory.set_word(address as usize, value);

    Ok(Continue)
}

/// VAR:226 Store a byte in the given array and byte index.
pub fn storeb(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let array = ops.pull()?;
    let byte_index = ops.pull()?;
    let value = ops.pull()?;
    let address = array.wrapping_add(byte_index);

    state.memory.set_byte(address as usize, value as u8);

    Ok(Continue)
}

/// VAR:227 Update the property data of the given object.
pub fn put_prop(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let object = ops.pull()?;
    let property_id = ops.pull()?;
    let value = ops.pull()?;

    let property = state
        .memory
        .property(object, property_id)
        .ok_or_else(|| GameError::InvalidOperation("Property data doesn't exist".into()))?;

    match property.data.len() {
        1 => state
            .memory
            .set_byte(property.data_address as usize, value as u8),
        2 => state.memory.set_word(property.data_address as usize, value),
        _ => {
            return Err(GameError::InvalidOperation(
                "Cannot assign property with length greater than 2".into(),
            )
            .into())
        }
    }

    Ok(Continue)
}

/// VAR:228 Read a line of input into the text buffer and tokenize it
/// into the parse buffer.
pub fn sread(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let text = ops.pull()?;
    let parse = ops.pull()?;

    Ok(Suspend(Callout::Read { text, parse }))
}

/// VAR:229 Print a ZSCII character.
pub fn print_char(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let char_id = ops.pull()?;

    let text = match char_id {
        0 => String::new(),
        13 => "\n".to_string(),
        c => ((c as u8) as char).to_string(),
    };

    Ok(Suspend(Callout::Print(text)))
}

/// VAR:230 Print a signed number.
pub fn print_num(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let num = ops.pull_signed()?;

    Ok(Suspend(Callout::Print(format!("{}", num))))
}

/// VAR:231 If the argument is positive, store a random number between 1
/// and the argument. A negative argument re-seeds the generator with
/// its magnitude, zero re-seeds from entropy; both store 0.
pub fn random(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let range = ops.pull_signed()?;
    match range.cmp(&0) {
        Ordering::Less => {
            state.seed_random(range.unsigned_abs() as u32);
            state.store_result(0)?;
        }
        Ordering::Equal => {
            state.seed_random(rand::random());
            state.store_result(0)?;
        }
        Ordering::Greater => {
            let result = state.next_random(range as u16);
            state.store_result(result)?;
        }
    };

    Ok(Continue)
}

/// VAR:232 Push a value onto the stack.
pub fn push(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let value = ops.pull()?;

    state.push_stack(value);

    Ok(Continue)
}

/// VAR:233 Pull a value off the stack and store it without pushing.
pub fn pull(
    state: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let variable: u8 = ops.pull()?.try_into()?;
    let value = state.pop_stack()?;

    state.poke_variable(variable, value)?;

    Ok(Continue)
}

/// VAR:234 Split the upper window to the given height.
pub fn split_window(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let height = ops.pull()?;

    Ok(Suspend(Callout::Split(height)))
}

/// VAR:235 Select the output window.
pub fn set_window(
    _: &mut GameState,
    mut ops: OperandSet,
) -> Result<InstructionResult> {
    let window = ops.pull()?;

    Ok(Suspend(Callout::Screen(window)))
}
