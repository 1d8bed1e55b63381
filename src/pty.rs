use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use anyhow::{Result, anyhow};
use bytes::Bytes;
use log::{debug, info};
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;

/// The interactive process a session drives.
pub trait ShellProcess: Send + Sync {
    fn write(&self, data: &[u8]) -> Result<()>;
    fn resize(&self, cols: u16, rows: u16) -> Result<()>;
    fn terminate(&self);
}

#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub program: String,
    pub cwd: PathBuf,
    pub cols: u16,
    pub rows: u16,
}

/// A shell running on a pseudo-terminal. Dropping it kills the child.
pub struct PtyProcess {
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    child: Mutex<Option<Box<dyn Child + Send + Sync>>>,
}

impl PtyProcess {
    /// Spawns the shell and returns it with the reader for its output.
    pub fn spawn(command: &ShellCommand) -> Result<(Self, Box<dyn Read + Send>)> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(PtySize {
            rows: command.rows,
            cols: command.cols,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let mut cmd = CommandBuilder::new(&command.program);
        cmd.cwd(&command.cwd);
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");

        let child = pair.slave.spawn_command(cmd)?;
        let reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;

        info!(
            "Spawned {} ({}x{}) in {:?}",
            command.program, command.cols, command.rows, command.cwd
        );

        Ok((
            Self {
                master: Mutex::new(pair.master),
                writer: Mutex::new(writer),
                child: Mutex::new(Some(child)),
            },
            reader,
        ))
    }
}

impl ShellProcess for PtyProcess {
    fn write(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| anyhow!("PTY writer poisoned"))?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let master = self.master.lock().map_err(|_| anyhow!("PTY master poisoned"))?;
        master.resize(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        })?;
        Ok(())
    }

    fn terminate(&self) {
        let Ok(mut guard) = self.child.lock() else {
            return;
        };
        if let Some(mut child) = guard.take() {
            if let Err(e) = child.kill() {
                debug!("kill on exited shell: {}", e);
            }
            let _ = child.wait();
            info!("Shell terminated");
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Copies process output into `tx` on a dedicated thread until the process
/// side closes. The channel closing is the session's exit signal.
pub fn spawn_output_pump(
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::Sender<Bytes>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut buffer = [0u8; 8192];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(Bytes::copy_from_slice(&buffer[..n])).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("PTY read ended: {}", e);
                    break;
                }
            }
        }
        debug!("PTY output pump finished");
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn pump_forwards_until_eof() {
        let (tx, mut rx) = mpsc::channel(4);
        let reader: Box<dyn Read + Send> = Box::new(Cursor::new(b"prompt$ ".to_vec()));
        let handle = spawn_output_pump(reader, tx);

        let mut seen = Vec::new();
        while let Some(chunk) = rx.recv().await {
            seen.extend_from_slice(&chunk);
        }
        assert_eq!(seen, b"prompt$ ");
        handle.join().unwrap();
    }
}
