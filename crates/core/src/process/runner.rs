//! Tokio-backed process runner.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Invocation, ProcessError, ProcessResult, ProcessRunner};

/// How long to wait for the output pipes to close once the child is gone.
/// A grandchild holding the pipe open must not stall the caller.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs invocations with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    fn name(&self) -> &str {
        "tokio"
    }

    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<ProcessResult, ProcessError> {
        let started = Instant::now();
        debug!(command = %invocation, timeout_ms = timeout.as_millis() as u64, "Spawning process");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches helpers the tool forks
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| ProcessError::from_spawn(&invocation.program, e))?;

        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => (status?.code(), false),
            Err(_) => {
                warn!(
                    program = %invocation.program_name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Process timed out, killing"
                );
                #[cfg(unix)]
                kill_group(child.id());
                // kill() also waits, so the child is reaped here
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out process");
                }
                (None, true)
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        debug!(
            program = %invocation.program_name(),
            exit_code = ?exit_code,
            timed_out,
            duration_ms,
            "Process finished"
        );

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
            duration_ms,
        })
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid, error = %e, "Failed to kill process group");
    }
}

fn spawn_reader<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            // Partial output is still useful for diagnostics
            let _ = stream.read_to_end(&mut buf).await;
        }
        buf
    })
}

async fn drain(mut task: JoinHandle<Vec<u8>>) -> String {
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(_)) => String::new(),
        Err(_) => {
            task.abort();
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_streams_and_exit_code() {
        let runner = TokioProcessRunner::new();
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("echo out; echo err 1>&2; exit 3");

        let result = runner.run(&inv, Duration::from_secs(5)).await.unwrap();

        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert!(!result.timed_out);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runner = TokioProcessRunner::new();
        let result = runner
            .run(&Invocation::new("true"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = TokioProcessRunner::new();
        let inv = Invocation::new("sleep").arg("10");

        let started = Instant::now();
        let result = runner.run(&inv, Duration::from_millis(100)).await.unwrap();
        let elapsed = started.elapsed();

        assert!(result.timed_out);
        assert_eq!(result.exit_code, None);
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_timeout_kills_forked_helpers() {
        let runner = TokioProcessRunner::new();
        // The background sleep inherits stdout; the pipe only closes once it dies
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("sleep 30 & echo started; wait");

        let started = Instant::now();
        let result = runner.run(&inv, Duration::from_millis(200)).await.unwrap();
        let elapsed = started.elapsed();

        assert!(result.timed_out);
        assert_eq!(result.stdout, "started\n");
        assert!(elapsed < DRAIN_TIMEOUT, "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_missing_program_is_typed_error() {
        let runner = TokioProcessRunner::new();
        let inv = Invocation::new("/definitely/not/a/real/tool");

        let err = runner.run(&inv, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_args_are_not_shell_interpreted() {
        let runner = TokioProcessRunner::new();
        let inv = Invocation::new("echo").arg("$HOME; rm -rf /");

        let result = runner.run(&inv, Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.stdout, "$HOME; rm -rf /\n");
    }
}
