mod form;
mod instruction;
mod instruction_set;
mod op_code;
mod operand;
mod operand_set;
mod result;

pub use form::Form;
pub use instruction::Instruction;
pub use instruction_set::InstructionSet;
pub use op_code::OpCode;
pub use operand::Operand;
pub use operand_set::OperandSet;
pub use result::{Callout, Result};
