//! Child process control: inherited stdio, relayed stderr, staged termination.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// How a waited-on child finished.
#[derive(Debug, Clone, Copy)]
pub struct WaitOutcome {
    pub status: ExitStatus,
    /// The timeout expired and the child was terminated.
    pub timed_out: bool,
}

/// A running child whose stderr is copied to our stdout.
#[derive(Debug)]
pub struct RelayedChild {
    child: Child,
    relay: Option<thread::JoinHandle<Result<()>>>,
}

/// Spawn `cmd` with stdin/stdout inherited and stderr relayed to stdout.
///
/// Spawn failures are returned unwrapped so callers can inspect the
/// [`std::io::ErrorKind`].
pub fn spawn_relayed(cmd: &mut Command) -> std::io::Result<RelayedChild> {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd.spawn()?;
    let relay = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || relay_to_stdout(stderr)));
    Ok(RelayedChild { child, relay })
}

impl RelayedChild {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait for exit with no time limit.
    pub fn wait(mut self) -> Result<ExitStatus> {
        let status = self.child.wait().context("wait for command")?;
        join_relay(self.relay.take());
        debug!(exit_code = ?status.code(), "command finished");
        Ok(status)
    }

    /// Wait up to `timeout`, then SIGTERM, then SIGKILL after `grace`.
    #[instrument(skip_all, fields(timeout_ms = timeout.as_millis() as u64))]
    pub fn wait_with_timeout(self, timeout: Duration, grace: Duration) -> Result<WaitOutcome> {
        self.wait_with_timeout_using(timeout, grace, request_termination)
    }

    /// Timed wait with a pluggable termination request.
    ///
    /// The child is always reaped before this returns, even on error.
    fn wait_with_timeout_using<F>(
        mut self,
        timeout: Duration,
        grace: Duration,
        request: F,
    ) -> Result<WaitOutcome>
    where
        F: FnOnce(&mut Child) -> Result<()>,
    {
        let waited = match self.child.wait_timeout(timeout).context("wait for command") {
            Ok(waited) => waited,
            Err(err) => {
                force_reap(&mut self.child);
                return Err(err);
            }
        };
        if let Some(status) = waited {
            join_relay(self.relay.take());
            debug!(exit_code = ?status.code(), "command finished");
            return Ok(WaitOutcome {
                status,
                timed_out: false,
            });
        }

        warn!("command exceeded its timeout, requesting termination");
        let status = match terminate(&mut self.child, grace, request) {
            Ok(status) => status,
            Err(err) => {
                force_reap(&mut self.child);
                return Err(err);
            }
        };

        // Grandchildren may still hold the stderr pipe; leave the relay to drain on its own.
        drop(self.relay.take());
        debug!(exit_code = ?status.code(), "command terminated after timeout");
        Ok(WaitOutcome {
            status,
            timed_out: true,
        })
    }
}

/// Request termination, then escalate to SIGKILL once `grace` elapses.
fn terminate<F>(child: &mut Child, grace: Duration, request: F) -> Result<ExitStatus>
where
    F: FnOnce(&mut Child) -> Result<()>,
{
    request(child)?;
    if let Some(status) = child
        .wait_timeout(grace)
        .context("wait for command after termination request")?
    {
        return Ok(status);
    }
    warn!(
        grace_ms = grace.as_millis() as u64,
        "command ignored termination request, killing"
    );
    child.kill().context("kill command")?;
    child.wait().context("wait command after kill")
}

/// Best-effort SIGKILL and reap after the termination sequence failed.
fn force_reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(err = %err, "kill after failed termination");
    }
    match child.wait() {
        Ok(status) => debug!(exit_code = ?status.code(), "command reaped after failed termination"),
        Err(err) => warn!(err = %err, "failed to reap command"),
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let pid = i32::try_from(child.id()).context("child pid out of range")?;
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(err).context("send SIGTERM"),
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}

fn relay_to_stdout(stderr: ChildStderr) -> Result<()> {
    relay_lines(stderr, std::io::stdout())
}

/// Copy `reader` to `writer` line by line, flushing after each line.
fn relay_lines<R: Read, W: Write>(reader: R, mut writer: W) -> Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).context("read stderr")?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&line).context("relay stderr")?;
        writer.flush().context("flush relayed stderr")?;
    }
}

fn join_relay(handle: Option<thread::JoinHandle<Result<()>>>) {
    let Some(handle) = handle else {
        return;
    };
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(err = %format!("{err:#}"), "stderr relay failed"),
        Err(_) => warn!("stderr relay thread panicked"),
    }
}
