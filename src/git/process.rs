use super::error::{GitError, Result};
use crate::event::OutputSource;
use log::debug;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};

/// Read size for each stdout/stderr chunk.
const CHUNK_SIZE: usize = 8192;

/// Poll interval while waiting for the child to exit after its pipes close.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Grace period for draining chunks buffered before a timeout kill. A
/// killed child can leave grandchildren holding the pipes open, so the
/// drain must not block indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(50);

/// Output collected from a completed subprocess.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One subprocess run: binary, arguments, environment overlay, working
/// directory, and deadline.
///
/// Output chunks are surfaced through a callback on the calling thread, in
/// the order they are emitted by the child. The run blocks until the child
/// exits or the deadline elapses, at which point the child is killed.
#[derive(Debug, Clone)]
pub struct GitProcess {
    binary: PathBuf,
    args: Vec<String>,
    directory: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout: Duration,
}

impl GitProcess {
    pub fn new(
        binary: PathBuf,
        args: Vec<String>,
        directory: Option<PathBuf>,
        env: HashMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            binary,
            args,
            directory,
            env,
            timeout,
        }
    }

    /// Run the subprocess to completion, invoking `on_output` for every
    /// chunk as it arrives.
    ///
    /// Fails with `CommandFailed` on a non-zero exit, `Timeout` when the
    /// deadline elapses, or the callback's own error if it returns one;
    /// output collected up to the failure is attached to the error.
    pub fn run<F>(&self, mut on_output: F) -> Result<ProcessOutput>
    where
        F: FnMut(OutputSource, &[u8]) -> Result<()>,
    {
        debug!(
            target: "gitwrap.process",
            "spawning {} {}",
            self.binary.display(),
            self.args.join(" ")
        );

        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(&self.env);
        if let Some(directory) = &self.directory {
            command.current_dir(directory);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::Configuration(format!(
                    "unable to execute {}: {e}",
                    self.binary.display()
                ))
            } else {
                GitError::Io(e)
            }
        })?;

        let (tx, rx) = channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(OutputSource::Stdout, stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(OutputSource::Stderr, stderr, tx.clone());
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Drain chunks on this thread until both pipes close or the
        // deadline passes.
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timed_out(child, rx, &mut on_output, stdout, stderr));
            }

            match rx.recv_timeout(remaining) {
                Ok((source, chunk)) => {
                    match source {
                        OutputSource::Stdout => stdout.extend_from_slice(&chunk),
                        OutputSource::Stderr => stderr.extend_from_slice(&chunk),
                    }
                    if let Err(err) = on_output(source, &chunk) {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(self.timed_out(child, rx, &mut on_output, stdout, stderr));
                }
                Err(RecvTimeoutError::Disconnected) => break, // Both pipes closed
            }
        }

        // The child normally exits right after closing its pipes, but keep
        // honoring the deadline in case it lingers.
        loop {
            if let Some(status) = child.try_wait()? {
                let stdout = String::from_utf8_lossy(&stdout).into_owned();
                let stderr = String::from_utf8_lossy(&stderr).into_owned();

                if status.success() {
                    debug!(target: "gitwrap.process", "command completed");
                    return Ok(ProcessOutput { stdout, stderr });
                }

                return Err(GitError::CommandFailed {
                    code: status.code(),
                    stdout,
                    stderr,
                });
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timeout_error(stdout, stderr));
            }

            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    /// Kill the child on deadline, then drain and deliver any chunks that
    /// were emitted before it died so listeners observe partial output.
    fn timed_out<F>(
        &self,
        mut child: Child,
        rx: Receiver<(OutputSource, Vec<u8>)>,
        on_output: &mut F,
        mut stdout: Vec<u8>,
        mut stderr: Vec<u8>,
    ) -> GitError
    where
        F: FnMut(OutputSource, &[u8]) -> Result<()>,
    {
        let _ = child.kill();
        let _ = child.wait();

        while let Ok((source, chunk)) = rx.recv_timeout(DRAIN_GRACE) {
            match source {
                OutputSource::Stdout => stdout.extend_from_slice(&chunk),
                OutputSource::Stderr => stderr.extend_from_slice(&chunk),
            }
            if let Err(err) = on_output(source, &chunk) {
                return err;
            }
        }

        self.timeout_error(stdout, stderr)
    }

    fn timeout_error(&self, stdout: Vec<u8>, stderr: Vec<u8>) -> GitError {
        GitError::Timeout {
            timeout: self.timeout,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }
}

/// Forward chunks from one pipe to the channel until EOF.
fn spawn_reader<R: Read + Send + 'static>(
    source: OutputSource,
    mut reader: R,
    tx: Sender<(OutputSource, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((source, buf[..n].to_vec())).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(_) => break,
            }
        }
    });
}
