use std::fs;
use std::io::{self, Stdout, Write};
use std::path::PathBuf;

use anyhow::Result;
use log::{info, warn};

use crate::host::Host;

/// A host that plays on plain standard input and output, with saves
/// kept in a single file next to the story.
pub struct StdioHost {
    stdout: Stdout,
    save_path: PathBuf,
}

impl StdioHost {
    pub fn new(save_path: PathBuf) -> StdioHost {
        StdioHost {
            stdout: io::stdout(),
            save_path,
        }
    }
}

impl Host for StdioHost {
    fn print(&mut self, text: &str, _scripting: bool) -> Result<()> {
        write!(self.stdout, "{}", text)?;
        self.stdout.flush()?;
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<String> {
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let line = line.trim_end_matches(['\n', '\r']);
        Ok(line.chars().take(max_len).collect())
    }

    fn save(&mut self, data: &[u8]) -> Result<bool> {
        match fs::write(&self.save_path, data) {
            Ok(()) => {
                info!("Saved {} bytes to {}", data.len(), self.save_path.display());
                Ok(true)
            }
            Err(e) => {
                warn!("Couldn't write save file: {}", e);
                Ok(false)
            }
        }
    }

    fn restore(&mut self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.save_path) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!("Couldn't read save file: {}", e);
                Ok(None)
            }
        }
    }
}
