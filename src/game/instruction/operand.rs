use std::fmt::{self, Debug, Display, Formatter};

/// A decoded operand, before variable references are resolved.
pub enum Operand {
    LargeConstant(u16),
    SmallConstant(u8),
    Variable(u8),
    Omitted,
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::LargeConstant(v) => write!(f, "LargeConstant({:x})", v),
            Operand::SmallConstant(v) => write!(f, "SmallConstant({:x})", v),
            Operand::Variable(v) => write!(f, "Variable({:x})", v),
            Operand::Omitted => write!(f, "Omitted"),
        }
    }
}

impl Debug for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self, f)
    }
}
