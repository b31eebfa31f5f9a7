use std::collections::VecDeque;

use anyhow::Result;

use crate::host::{Host, Screen};

/// A host driven by a prepared script of input lines, recording
/// everything the machine hands back. Used by tests.
#[derive(Default)]
pub struct ScriptedHost {
    pub input: VecDeque<String>,
    pub output: String,
    pub saved: Option<Vec<u8>>,
    pub save_succeeds: bool,
    pub statuses: Vec<(String, u16, u16)>,
    pub highlights: Vec<bool>,
    pub splits: Vec<u16>,
    pub windows: Vec<Screen>,
    pub restarts: usize,
    pub with_status: bool,
    pub with_split: bool,
}

impl ScriptedHost {
    pub fn new() -> ScriptedHost {
        ScriptedHost {
            save_succeeds: true,
            ..Default::default()
        }
    }

    pub fn with_input(lines: &[&str]) -> ScriptedHost {
        let mut host = ScriptedHost::new();
        host.input = lines.iter().map(|s| s.to_string()).collect();
        host
    }
}

impl Host for ScriptedHost {
    fn print(&mut self, text: &str, _scripting: bool) -> Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<String> {
        let line = self.input.pop_front().unwrap_or_default();
        Ok(line.chars().take(max_len).collect())
    }

    fn highlight(&mut self, fixed_pitch: bool) -> Result<()> {
        self.highlights.push(fixed_pitch);
        Ok(())
    }

    fn save(&mut self, data: &[u8]) -> Result<bool> {
        if self.save_succeeds {
            self.saved = Some(data.to_vec());
        }
        Ok(self.save_succeeds)
    }

    fn restore(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.saved.take())
    }

    fn restarted(&mut self) -> Result<()> {
        self.restarts += 1;
        Ok(())
    }

    fn has_status(&self) -> bool {
        self.with_status
    }

    fn status(&mut self, location: &str, score: u16, moves: u16) -> Result<()> {
        self.statuses.push((location.to_string(), score, moves));
        Ok(())
    }

    fn has_split(&self) -> bool {
        self.with_split
    }

    fn split(&mut self, height: u16) -> Result<()> {
        self.splits.push(height);
        Ok(())
    }

    fn screen(&mut self, window: Screen) -> Result<()> {
        self.windows.push(window);
        Ok(())
    }
}
