// Spawning external tools and streaming their output back to the UI.
//
// Each spawned process gets two reader threads (stdout, stderr) and a waiter
// thread. All of them report through one channel that the UI drains every
// frame. The process is started in its own process group so that stopping
// it also reaches the children it forks (e.g. `mpirun` ranks).

use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;

use super::commands::ShellCommand;
use crate::error::{FoamError, Result};
use crate::models::{OutputStream, ProcessEvent, ProcessId};

/// A process started by [`ProcessRunner::spawn`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    pub id: ProcessId,
    pub pid: u32,
}

pub struct ProcessRunner {
    next_id: ProcessId,
    tx: Sender<ProcessEvent>,
    rx: Receiver<ProcessEvent>,
    /// Woken whenever an event is queued so the window redraws
    repaint: Option<egui::Context>,
}

impl ProcessRunner {
    pub fn new(repaint: Option<egui::Context>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            next_id: 1,
            tx,
            rx,
            repaint,
        }
    }

    /// Starts `cmd` with captured output.
    pub fn spawn(&mut self, cmd: &ShellCommand) -> Result<ProcessHandle> {
        let mut command = build_command(cmd);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);

        let mut child = command.spawn().map_err(|e| FoamError::Spawn {
            program: cmd.program.clone(),
            source: e,
        })?;

        let id = self.next_id;
        self.next_id += 1;
        let pid = child.id();

        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(self.forward_lines(id, OutputStream::Stdout, out));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(self.forward_lines(id, OutputStream::Stderr, err));
        }

        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let program = cmd.program.clone();
        thread::spawn(move || {
            let code = match child.wait() {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!("waiting for {} (pid {}) failed: {}", program, pid, e);
                    None
                }
            };
            for reader in readers {
                let _ = reader.join();
            }
            tracing::info!("{} (pid {}) exited with {:?}", program, pid, code);
            let _ = tx.send(ProcessEvent::Finished { id, code });
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });

        tracing::info!("Started {} (pid {})", cmd, pid);
        Ok(ProcessHandle { id, pid })
    }

    /// Starts `cmd` without capturing output and forgets about it.
    /// Returns the pid once the program is running.
    pub fn launch_detached(&self, cmd: &ShellCommand) -> Result<u32> {
        let mut command = build_command(cmd);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = command.spawn().map_err(|e| FoamError::Spawn {
            program: cmd.program.clone(),
            source: e,
        })?;
        let pid = child.id();

        // reap it so it does not linger as a zombie
        thread::spawn(move || {
            let _ = child.wait();
        });

        tracing::info!("Launched {} (pid {})", cmd, pid);
        Ok(pid)
    }

    /// Sends SIGTERM to the process group of `handle`.
    pub fn terminate(&self, handle: &ProcessHandle) -> Result<()> {
        let pid = handle.pid as i32;
        // pid 0 or 1 would address our own group or init
        if pid <= 1 {
            return Err(FoamError::Signal {
                pid,
                source: nix::errno::Errno::ESRCH,
            });
        }
        killpg(Pid::from_raw(pid), Signal::SIGTERM)
            .map_err(|source| FoamError::Signal { pid, source })?;
        tracing::info!("Sent SIGTERM to process group {}", pid);
        Ok(())
    }

    /// Events queued since the last call, in arrival order.
    pub fn drain(&self) -> Vec<ProcessEvent> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn wait_event(&self, timeout: std::time::Duration) -> Option<ProcessEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn forward_lines<R: Read + Send + 'static>(
        &self,
        id: ProcessId,
        stream: OutputStream,
        pipe: R,
    ) -> thread::JoinHandle<()> {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        thread::spawn(move || {
            let mut reader = BufReader::new(pipe);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf)
                            .trim_end_matches(['\n', '\r'])
                            .to_string();
                        if tx.send(ProcessEvent::Output { id, stream, line }).is_err() {
                            break;
                        }
                        if let Some(ctx) = &repaint {
                            ctx.request_repaint();
                        }
                    }
                    Err(e) => {
                        tracing::debug!("reading {:?} of process {} failed: {}", stream, id, e);
                        break;
                    }
                }
            }
        })
    }
}

fn build_command(cmd: &ShellCommand) -> Command {
    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args);
    command.envs(cmd.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(dir) = &cmd.working_dir {
        command.current_dir(dir);
    }
    command
}
