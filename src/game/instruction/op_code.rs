use std::fmt::{self, Debug, Display, Formatter};

/// An op code number together with its operand-count category, the key
/// into the instruction table.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum OpCode {
    ZeroOp(u8),
    OneOp(u8),
    TwoOp(u8),
    VarOp(u8),
}

impl Display for OpCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            OpCode::TwoOp(v) => write!(f, "2OP:{}", v),
            OpCode::OneOp(v) => write!(f, "1OP:{}", v + 128),
            OpCode::ZeroOp(v) => write!(f, "0OP:{}", v + 176),
            OpCode::VarOp(v) => write!(f, "VAR:{}", v + 224),
        }
    }
}

impl Debug for OpCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self, f)
    }
}
