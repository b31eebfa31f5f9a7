mod script;
mod stdio;

pub use script::ScriptedHost;
pub use stdio::StdioHost;

use anyhow::Result;
use num_derive::FromPrimitive;

/// The output window selected by the game when the screen is split.
#[derive(FromPrimitive, Copy, Clone, PartialEq, Debug)]
pub enum Screen {
    Lower = 0,
    Upper = 1,
}

/// The surrounding program driving the machine. Responsible for all
/// real I/O: the engine hands text and save data out through these
/// methods and never touches a device itself.
///
/// Only `print`, `read`, `save` and `restore` are required; the
/// remainder default to doing nothing, and the engine advertises the
/// optional capabilities to the game based on `has_status`/`has_split`.
pub trait Host {
    /// Show text to the player. `scripting` mirrors the transcript bit
    /// the game controls.
    fn print(&mut self, text: &str, scripting: bool) -> Result<()>;

    /// Read one line of input, at most `max_len` characters.
    fn read(&mut self, max_len: usize) -> Result<String>;

    /// The fixed-pitch font bit changed. Called once at startup and
    /// then before the first print after every change.
    fn highlight(&mut self, _fixed_pitch: bool) -> Result<()> {
        Ok(())
    }

    /// Keep the serialized game state. Returns whether it was stored.
    fn save(&mut self, data: &[u8]) -> Result<bool>;

    /// Produce previously saved game state, if there is any.
    fn restore(&mut self) -> Result<Option<Vec<u8>>>;

    /// The machine was (re)initialized.
    fn restarted(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether this host renders a status line.
    fn has_status(&self) -> bool {
        false
    }

    /// Redraw the status line: the current location's name plus the
    /// score and move counters (hours and minutes for time games).
    fn status(&mut self, _location: &str, _score: u16, _moves: u16) -> Result<()> {
        Ok(())
    }

    /// Whether this host supports a split screen.
    fn has_split(&self) -> bool {
        false
    }

    /// Resize the upper window.
    fn split(&mut self, _height: u16) -> Result<()> {
        Ok(())
    }

    /// Route output to the given window.
    fn screen(&mut self, _window: Screen) -> Result<()> {
        Ok(())
    }

    /// Judge a VERIFY instruction. The default accepts the engine's own
    /// checksum verdict.
    fn verify(&mut self, checksum_ok: bool) -> bool {
        checksum_ok
    }
}
