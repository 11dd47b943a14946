use crate::error::SpawnError;
use log::{debug, warn};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::thread;

/// Runs the command bound to a trigger. Must return without waiting for it.
pub(crate) trait Executor {
    fn execute(&mut self, command: &str) -> Result<(), SpawnError>;
}

/// Runs actions through `/bin/sh -c`, detached from the terminal's process group.
pub(crate) struct ShellExecutor {
    verbose: bool,
}

impl ShellExecutor {
    /// `verbose` keeps the action's stdio attached; otherwise it goes to `/dev/null`.
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn stdio(&self) -> Stdio {
        if self.verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl Executor for ShellExecutor {
    fn execute(&mut self, command: &str) -> Result<(), SpawnError> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(self.stdio())
            .stdout(self.stdio())
            .stderr(self.stdio())
            .process_group(0)
            .spawn()
            .map_err(|source| SpawnError::Spawn {
                command: command.to_owned(),
                source,
            })?;

        let command = command.to_owned();
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!("{:?} exited: {}", command, status),
            Err(e) => warn!("Failed to reap {:?}: {}", command, e),
        });

        Ok(())
    }
}
