use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;

use portable_pty::{native_pty_system, Child, CommandBuilder, ExitStatus, MasterPty, PtySize};

use crate::error::PtyError;

/// Parameters for spawning a shell or custom command in a fresh PTY.
#[derive(Debug, Clone, Default)]
pub struct SpawnConfig {
    pub cols: u16,
    pub rows: u16,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl SpawnConfig {
    pub fn shell(cols: u16, rows: u16) -> Self {
        SpawnConfig {
            cols,
            rows,
            ..Default::default()
        }
    }

    fn resolve_command(&self) -> CommandBuilder {
        let mut cmd = match &self.command {
            Some(command) => CommandBuilder::new(command),
            None => CommandBuilder::new_default_prog(),
        };
        for arg in &self.args {
            cmd.arg(arg);
        }
        if let Some(cwd) = &self.cwd {
            cmd.cwd(cwd);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

fn to_pty_size(cols: u16, rows: u16) -> PtySize {
    PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// An owned PTY plus its child process.
///
/// Holds the writer half directly (one writer per PTY, matching
/// `portable_pty`'s single-writer contract); readers may be cloned
/// independently via `try_clone_reader`.
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    cols: u16,
    rows: u16,
}

impl PtyHandle {
    pub fn spawn(config: &SpawnConfig) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(to_pty_size(config.cols, config.rows))
            .map_err(|e| PtyError::Open(e.into()))?;

        let cmd = config.resolve_command();
        log::info!(
            "spawning pty command={:?} cols={} rows={}",
            config.command,
            config.cols,
            config.rows
        );
        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::Spawn(e.into()))?;

        // The slave end belongs to the child now; dropping it here (on
        // platforms where portable_pty keeps it open) avoids leaking an
        // extra handle to our own PTY.
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Open(e.into()))?;

        Ok(PtyHandle {
            master: pair.master,
            child,
            writer,
            cols: config.cols,
            rows: config.rows,
        })
    }

    /// Clones a new reader for this PTY's master side. `portable_pty`
    /// supports any number of concurrent readers.
    pub fn try_clone_reader(&self) -> Result<Box<dyn Read + Send>, PtyError> {
        self.master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.into()))
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data).map_err(PtyError::Write)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        if cols == self.cols && rows == self.rows {
            return Ok(());
        }
        self.master
            .resize(to_pty_size(cols, rows))
            .map_err(|e| PtyError::Resize(e.into()))?;
        self.cols = cols;
        self.rows = rows;
        Ok(())
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, PtyError> {
        self.child.try_wait().map_err(PtyError::Wait)
    }

    pub fn kill(&mut self) -> Result<(), PtyError> {
        self.child.kill().map_err(PtyError::Kill)
    }
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        if matches!(self.try_wait(), Ok(None))
            && let Err(e) = self.kill()
        {
            log::warn!("failed to kill child process on drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn spawns_and_kills_a_simple_command() {
        let config = SpawnConfig {
            cols: 80,
            rows: 24,
            command: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..Default::default()
        };
        let mut handle = PtyHandle::spawn(&config).expect("spawn");
        assert_eq!(handle.cols(), 80);
        assert_eq!(handle.rows(), 24);
        assert!(matches!(handle.try_wait(), Ok(None)));
        handle.kill().expect("kill");
    }

    #[cfg(unix)]
    #[test]
    fn resize_updates_dimensions() {
        let config = SpawnConfig {
            cols: 80,
            rows: 24,
            command: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
            ..Default::default()
        };
        let mut handle = PtyHandle::spawn(&config).expect("spawn");
        handle.resize(100, 40).expect("resize");
        assert_eq!(handle.cols(), 100);
        assert_eq!(handle.rows(), 40);
        handle.kill().expect("kill");
    }

    #[cfg(unix)]
    #[test]
    fn spawned_command_runs_in_the_requested_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        let expected = dir.path().canonicalize().expect("canonicalize");

        let config = SpawnConfig {
            cols: 80,
            rows: 24,
            command: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "pwd".to_string()],
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let handle = PtyHandle::spawn(&config).expect("spawn");
        let mut reader = handle.try_clone_reader().expect("clone reader");

        // The child exits right after printing, closing its end of the
        // pty; the read loop ends on EOF rather than polling `try_wait`.
        let mut output = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
        }

        let printed = String::from_utf8_lossy(&output);
        assert!(
            printed.contains(expected.to_str().unwrap()),
            "expected pwd output to contain {expected:?}, got {printed:?}"
        );
    }
}
