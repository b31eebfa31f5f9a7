use std::fmt::{self, Debug, Display, Formatter};

use itertools::Itertools;

use crate::game::error::GameError;

/// The operand values of one instruction, resolved in decode order.
/// Variable operands have already been fetched, so pulling values off
/// the set never touches the data stack.
pub struct OperandSet {
    index: usize,
    set: Vec<u16>,
}

impl OperandSet {
    pub fn new(set: Vec<u16>) -> OperandSet {
        OperandSet { index: 0, set }
    }

    pub fn pull(&mut self) -> Result<u16, GameError> {
        self.next()
            .ok_or_else(|| GameError::InvalidOperation("Instruction has too few operands".into()))
    }

    pub fn pull_signed(&mut self) -> Result<i16, GameError> {
        Ok(self.pull()? as i16)
    }
}

impl Iterator for OperandSet {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.set.get(self.index).copied();
        self.index += 1;
        result
    }
}

impl Display for OperandSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.set.iter().map(|v| format!("{:x}", v)).join(","))
    }
}

impl Debug for OperandSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self, f)
    }
}
