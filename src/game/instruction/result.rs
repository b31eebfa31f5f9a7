/// The result of an instruction.
pub enum Result {
    /// Continue executing the current routine.
    Continue,
    /// Return from the current routine with the given value.
    Return(u16),
    /// Call a new routine at a packed address.
    Invoke { address: u16, arguments: Vec<u16> },
    /// Hand a request to the host before continuing.
    Suspend(Callout),
    /// Quit the game.
    Quit,
}

/// A request the driver loop delivers to the host. These are the only
/// points at which execution may suspend; everything else completes
/// synchronously.
pub enum Callout {
    /// Send text to the host's output.
    Print(String),
    /// Send text plus a newline, then return true from the routine.
    PrintRet(String),
    /// Read one line of input into the text buffer and tokenize it
    /// into the parse buffer.
    Read { text: u16, parse: u16 },
    /// Serialize the continuation and offer it to the host; branch on
    /// success.
    Save,
    /// Ask the host for saved data and install it; branch on success.
    Restore,
    /// Reinitialize image and continuation, keeping the shadow flags.
    Restart,
    /// Refresh the host's status line.
    Status,
    /// Verify the story file's checksum; branch if it holds.
    Verify,
    /// Split the upper window to the given height.
    Split(u16),
    /// Select the output window.
    Screen(u16),
}
