use anyhow::Result;

use crate::game::instruction::{OperandSet, Result as InstructionResult};
use crate::game::state::GameState;

/// A wrapper for instruction functions to associate them with their
/// argument types. Store and branch data are not part of the decoded
/// operands; handlers that need them consume the bytes at the program
/// counter themselves.
#[derive(Clone)]
pub enum Instruction {
    Normal(
        &'static dyn Fn(&mut GameState, OperandSet) -> Result<InstructionResult>,
        &'static str,
    ),
    StringLiteral(
        &'static dyn Fn(&mut GameState, String) -> Result<InstructionResult>,
        &'static str,
    ),
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Normal(_, name) => name,
            Instruction::StringLiteral(_, name) => name,
        }
    }
}
