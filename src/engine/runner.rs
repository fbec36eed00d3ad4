//! Runs external tools (exiftool, convert) as child processes.
//!
//! argv is passed through verbatim, no shell involved. stdout is streamed line by line to the
//! caller; stderr is collected on a side thread and attached to non-zero exits. Every live child
//! is tracked so [`ProcessRunner::kill_all`] can interrupt workers blocked on a child.

use log::{debug, warn};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use crate::pipeline::error_handler::JobError;
use crate::utils::config::CHILD_POLL_INTERVAL;

#[derive(Default)]
pub struct ProcessRunner {
    children: Mutex<HashMap<u64, Child>>,
    next_id: AtomicU64,
    shutdown: AtomicBool,
}

/// Short tool name for messages: file name of argv[0].
fn tool_name(program: &OsString) -> String {
    Path::new(program)
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run `argv` to completion, handing each stdout line (without newline) to `on_line`.
    /// Blocks the calling worker until the child exits or is killed.
    pub fn run(&self, argv: &[OsString], mut on_line: impl FnMut(&str)) -> Result<(), JobError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(JobError::SpawnFailure {
                name: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };
        let name = tool_name(program);
        if self.is_shut_down() {
            return Err(JobError::Interrupted);
        }
        debug!("Running {:?}", argv);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                warn!("{name} could not be started: {source}");
                JobError::SpawnFailure {
                    name: name.clone(),
                    source,
                }
            })?;

        let stdout = child.stdout.take();
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut text = String::new();
                let mut bytes = Vec::new();
                if stderr.read_to_end(&mut bytes).is_ok() {
                    text = String::from_utf8_lossy(&bytes).into_owned();
                }
                text
            })
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.children.lock().unwrap().insert(id, child);
        // kill_all may have run between the check above and the insert.
        if self.is_shut_down() {
            self.kill(id);
        }

        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => on_line(String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n'])),
                    Err(e) => {
                        debug!("{name}: stdout read failed: {e}");
                        break;
                    }
                }
            }
        }

        let status = self.wait(id);
        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        match status {
            Some(status) if status.success() => Ok(()),
            _ if self.is_shut_down() => Err(JobError::Interrupted),
            Some(status) => {
                let code = status.code().unwrap_or(-1);
                warn!("{name} exited with error code {code}");
                Err(JobError::NonZeroExit { name, code, stderr })
            }
            None => Err(JobError::NonZeroExit {
                name,
                code: -1,
                stderr,
            }),
        }
    }

    /// Poll until the tracked child exits, then untrack it. The table lock is only held per poll,
    /// so `kill_all` can get in between.
    fn wait(&self, id: u64) -> Option<ExitStatus> {
        loop {
            {
                let mut children = self.children.lock().unwrap();
                let child = children.get_mut(&id)?;
                match child.try_wait() {
                    Ok(Some(status)) => {
                        children.remove(&id);
                        return Some(status);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!("wait on child failed: {e}");
                        children.remove(&id);
                        return None;
                    }
                }
            }
            thread::sleep(CHILD_POLL_INTERVAL);
        }
    }

    fn kill(&self, id: u64) {
        if let Some(child) = self.children.lock().unwrap().get_mut(&id) {
            let _ = child.kill();
        }
    }

    /// Refuse new children and kill the running ones. Idempotent.
    pub fn kill_all(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut children = self.children.lock().unwrap();
        if !children.is_empty() {
            debug!("Killing {} running child process(es)", children.len());
        }
        for child in children.values_mut() {
            let _ = child.kill();
        }
    }
}
