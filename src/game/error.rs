use thiserror::Error;

/// Errors returned by GameState.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("The file you have specified is not a supported Z-Code file")]
    InvalidFile,
    #[error("Version {0} story files are not supported")]
    UnsupportedVersion(u8),
    #[error("Illegal instruction {0}")]
    InvalidOpcode(String),
    #[error("Error while running game: {0}")]
    InvalidOperation(String),
    #[error("Attempted to read from empty stack")]
    EmptyStack,
    #[error("Save data rejected: {0}")]
    RestoreFailed(String),
}
