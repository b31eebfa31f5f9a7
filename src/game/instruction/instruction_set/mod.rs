mod common;

use std::collections::HashMap;

use crate::game::instruction::OpCode::{OneOp, TwoOp, VarOp, ZeroOp};
use crate::game::instruction::{Instruction, OpCode};

/// Represents all the instructions available to the Version 3 machine.
/// Empty table slots are illegal instructions.
pub struct InstructionSet {
    instructions: HashMap<OpCode, Instruction>,
}

impl InstructionSet {
    pub fn new() -> InstructionSet {
        let instructions: HashMap<OpCode, Instruction> = [
            (TwoOp(0x1), Instruction::Normal(&common::je, "JE")),
            (TwoOp(0x2), Instruction::Normal(&common::jl, "JL")),
            (TwoOp(0x3), Instruction::Normal(&common::jg, "JG")),
            (TwoOp(0x4), Instruction::Normal(&common::dec_chk, "DEC_CHK")),
            (TwoOp(0x5), Instruction::Normal(&common::inc_chk, "INC_CHK")),
            (TwoOp(0x6), Instruction::Normal(&common::jin, "JIN")),
            (TwoOp(0x7), Instruction::Normal(&common::test, "TEST")),
            (TwoOp(0x8), Instruction::Normal(&common::or, "OR")),
            (TwoOp(0x9), Instruction::Normal(&common::and, "AND")),
            (
                TwoOp(0xA),
                Instruction::Normal(&common::test_attr, "TEST_ATTR"),
            ),
            (
                TwoOp(0xB),
                Instruction::Normal(&common::set_attr, "SET_ATTR"),
            ),
            (
                TwoOp(0xC),
                Instruction::Normal(&common::clear_attr, "CLEAR_ATTR"),
            ),
            (TwoOp(0xD), Instruction::Normal(&common::store, "STORE")),
            (
                TwoOp(0xE),
                Instruction::Normal(&common::insert_obj, "INSERT_OBJ"),
            ),
            (TwoOp(0xF), Instruction::Normal(&common::loadw, "LOADW")),
            (TwoOp(0x10), Instruction::Normal(&common::loadb, "LOADB")),
            (
                TwoOp(0x11),
                Instruction::Normal(&common::get_prop, "GET_PROP"),
            ),
            (
                TwoOp(0x12),
                Instruction::Normal(&common::get_prop_addr, "GET_PROP_ADDR"),
            ),
            (
                TwoOp(0x13),
                Instruction::Normal(&common::get_next_prop, "GET_NEXT_PROP"),
            ),
            (TwoOp(0x14), Instruction::Normal(&common::add, "ADD")),
            (TwoOp(0x15), Instruction::Normal(&common::sub, "SUB")),
            (TwoOp(0x16), Instruction::Normal(&common::mul, "MUL")),
            (TwoOp(0x17), Instruction::Normal(&common::div, "DIV")),
            (TwoOp(0x18), Instruction::Normal(&common::z_mod, "MOD")),
            (OneOp(0x0), Instruction::Normal(&common::jz, "JZ")),
            (
                OneOp(0x1),
                Instruction::Normal(&common::get_sibling, "GET_SIBLING"),
            ),
            (
                OneOp(0x2),
                Instruction::Normal(&common::get_child, "GET_CHILD"),
            ),
            (
                OneOp(0x3),
                Instruction::Normal(&common::get_parent, "GET_PARENT"),
            ),
            (
                OneOp(0x4),
                Instruction::Normal(&common::get_prop_len, "GET_PROP_LEN"),
            ),
            (OneOp(0x5), Instruction::Normal(&common::inc, "INC")),
            (OneOp(0x6), Instruction::Normal(&common::dec, "DEC")),
            (
                OneOp(0x7),
                Instruction::Normal(&common::print_addr, "PRINT_ADDR"),
            ),
            (
                OneOp(0x9),
                Instruction::Normal(&common::remove_obj, "REMOVE_OBJ"),
            ),
            (
                OneOp(0xA),
                Instruction::Normal(&common::print_obj, "PRINT_OBJ"),
            ),
            (OneOp(0xB), Instruction::Normal(&common::ret, "RET")),
            (OneOp(0xC), Instruction::Normal(&common::jump, "JUMP")),
            (
                OneOp(0xD),
                Instruction::Normal(&common::print_paddr, "PRINT_PADDR"),
            ),
            (OneOp(0xE), Instruction::Normal(&common::load, "LOAD")),
            (OneOp(0xF), Instruction::Normal(&common::not, "NOT")),
            (ZeroOp(0x0), Instruction::Normal(&common::rtrue, "RTRUE")),
            (ZeroOp(0x1), Instruction::Normal(&common::rfalse, "RFALSE")),
            (
                ZeroOp(0x2),
                Instruction::StringLiteral(&common::print, "PRINT"),
            ),
            (
                ZeroOp(0x3),
                Instruction::StringLiteral(&common::print_ret, "PRINT_RET"),
            ),
            (ZeroOp(0x4), Instruction::Normal(&common::nop, "NOP")),
            (ZeroOp(0x5), Instruction::Normal(&common::save, "SAVE")),
            (ZeroOp(0x6), Instruction::Normal(&common::restore, "RESTORE")),
            (ZeroOp(0x7), Instruction::Normal(&common::restart, "RESTART")),
            (
                ZeroOp(0x8),
                Instruction::Normal(&common::ret_popped, "RET_POPPED"),
            ),
            (ZeroOp(0x9), Instruction::Normal(&common::pop, "POP")),
            (ZeroOp(0xA), Instruction::Normal(&common::quit, "QUIT")),
            (
                ZeroOp(0xB),
                Instruction::Normal(&common::new_line, "NEW_LINE"),
            ),
            (
                ZeroOp(0xC),
                Instruction::Normal(&common::show_status, "SHOW_STATUS"),
            ),
            (ZeroOp(0xD), Instruction::Normal(&common::verify, "VERIFY")),
            (VarOp(0x0), Instruction::Normal(&common::call, "CALL")),
            (VarOp(0x1), Instruction::Normal(&common::storew, "STOREW")),
            (VarOp(0x2), Instruction::Normal(&common::storeb, "STOREB")),
            (
                VarOp(0x3),
                Instruction::Normal(&common::put_prop, "PUT_PROP"),
            ),
            (VarOp(0x4), Instruction::Normal(&common::sread, "SREAD")),
            (
                VarOp(0x5),
                Instruction::Normal(&common::print_char, "PRINT_CHAR"),
            ),
            (
                VarOp(0x6),
                Instruction::Normal(&common::print_num, "PRINT_NUM"),
            ),
            (VarOp(0x7), Instruction::Normal(&common::random, "RANDOM")),
            (VarOp(0x8), Instruction::Normal(&common::push, "PUSH")),
            (VarOp(0x9), Instruction::Normal(&common::pull, "PULL")),
            (
                VarOp(0xA),
                Instruction::Normal(&common::split_window, "SPLIT_WINDOW"),
            ),
            (
                VarOp(0xB),
                Instruction::Normal(&common::set_window, "SET_WINDOW"),
            ),
        ]
        .iter()
        .cloned()
        .collect();

        InstructionSet { instructions }
    }

    pub fn get(&self, opcode: &OpCode) -> Option<Instruction> {
        self.instructions.get(opcode).cloned()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        InstructionSet::new()
    }
}
