/*!
 * Process Launcher
 * Spawns a prepared command and wires it to the session streams
 */

use crate::core::errors::{ExecError, ExecResult};
use crate::core::types::{exit, ExitStatus};
use crate::sandbox::LaunchSpec;
use std::convert::Infallible;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{self, AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// How long output may stay open after the command itself has exited
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs launch specs with an optional deadline
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    deadline: Option<Duration>,
}

impl ProcessLauncher {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    /// Spawn `spec` and pump its stdio until it exits
    ///
    /// Session input feeds the child's stdin; child stdout and stderr are
    /// copied to `output` and `error`. Returns the child's exit status, or
    /// [`exit::DEADLINE_EXCEEDED`] if it had to be killed.
    pub async fn run<R, W, E>(
        &self,
        spec: &LaunchSpec,
        input: &mut R,
        output: &mut W,
        error: &mut E,
    ) -> ExecResult<ExitStatus>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
        E: AsyncWrite + Unpin + ?Sized,
    {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .env_clear()
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a deadline reaches everything the command forks
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let pgid = child.id();
        info!(program = %spec.program, os_pid = ?pgid, "Spawned command");

        let (Some(mut child_in), Some(mut child_out), Some(mut child_err)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(ExecError::Wait(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child stdio not captured",
            )));
        };

        let deadline = self.deadline;
        let (exited_tx, exited_rx) = oneshot::channel::<()>();

        let waiting = async {
            let status = wait_with_deadline(&mut child, deadline, pgid).await;
            let _ = exited_tx.send(());
            status
        };

        // Output is drained until the pipes close, but never for longer than
        // DRAIN_GRACE past the child's exit
        let draining = async {
            let pumps = async {
                tokio::join!(pump(&mut child_out, output), pump(&mut child_err, error))
            };
            tokio::pin!(pumps);

            tokio::select! {
                (out, err) = &mut pumps => {
                    if let Err(e) = out {
                        debug!(error = %e, "stdout pump ended with error");
                    }
                    if let Err(e) = err {
                        debug!(error = %e, "stderr pump ended with error");
                    }
                }
                _ = async {
                    let _ = exited_rx.await;
                    tokio::time::sleep(DRAIN_GRACE).await;
                } => {
                    warn!(grace = ?DRAIN_GRACE, "Output still held open after exit, killing process group");
                    kill_group(pgid);
                }
            }
        };

        let completion = async {
            let (status, ()) = tokio::join!(waiting, draining);
            status
        };

        // Closing the child's stdin once session input ends lets filters finish
        let feed = async {
            if let Err(e) = io::copy(input, &mut child_in).await {
                debug!(error = %e, "stdin pump ended with error");
            }
            let _ = child_in.shutdown().await;
            drop(child_in);
            std::future::pending::<Infallible>().await
        };

        tokio::select! {
            status = completion => status,
            never = feed => match never {},
        }
    }
}

async fn pump<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let copied = io::copy(reader, writer).await?;
    writer.flush().await?;
    Ok(copied)
}

async fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Duration>,
    pgid: Option<u32>,
) -> ExecResult<ExitStatus> {
    let status = match deadline {
        None => child.wait().await.map_err(ExecError::Wait)?,
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status.map_err(ExecError::Wait)?,
            Err(_) => {
                warn!(deadline = ?limit, "Command exceeded deadline, killing");
                kill_group(pgid);
                child.kill().await.map_err(ExecError::Wait)?;
                return Ok(exit::DEADLINE_EXCEEDED);
            }
        },
    };

    let code = exit_code(status);
    info!(exit_code = code, "Command exited");
    Ok(code)
}

/// SIGKILL every process in the command's group
#[cfg(unix)]
fn kill_group(pgid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = pgid.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!(pgid, "Killed process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: Option<u32>) {}

/// Map a child status to a session exit status
pub fn exit_code(status: std::process::ExitStatus) -> ExitStatus {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
