//! Bounded execution of solver processes
//!
//! Every failure is returned as data: a batch run must survive a missing
//! executable or a hanging solver.
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long to wait for buffered output after killing a child.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How a solver process ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Normal termination; `None` when killed by a signal
    Exited(Option<i32>),
    /// Killed after exceeding the time limit
    TimedOut,
    /// The process could not be started
    LaunchFailed(String),
}

impl Exit {
    pub fn code(&self) -> Option<i32> {
        match self {
            Exit::Exited(code) => *code,
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit: Exit,
    /// Wall-clock seconds; the time limit itself on timeout, 0 on launch failure
    pub elapsed: f64,
}

impl ProcessOutput {
    fn launch_failure(reason: String) -> Self {
        ProcessOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit: Exit::LaunchFailed(reason),
            elapsed: 0.0,
        }
    }
}

/// Run `program` with `args`, feeding `stdin` when given, for at most `timeout`.
pub async fn run(
    program: &Path,
    args: &[String],
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> ProcessOutput {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let start = Instant::now();
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("cannot launch {}: {}", program.display(), e);
            return ProcessOutput::launch_failure(e.to_string());
        }
    };
    let feeder: Option<JoinHandle<()>> = match (child.stdin.take(), stdin) {
        (Some(mut pipe), Some(payload)) => {
            let payload = payload.to_vec();
            Some(tokio::spawn(async move {
                // a solver may exit without reading everything
                if let Err(e) = pipe.write_all(&payload).await {
                    debug!("stdin closed early: {}", e);
                }
                let _ = pipe.shutdown().await;
            }))
        }
        _ => None,
    };
    let stdout = tokio::spawn(drain(child.stdout.take()));
    let stderr = tokio::spawn(drain(child.stderr.take()));
    let (exit, elapsed) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => (Exit::Exited(status.code()), start.elapsed().as_secs_f64()),
        Ok(Err(e)) => {
            warn!("waiting for {} failed: {}", program.display(), e);
            (Exit::Exited(None), start.elapsed().as_secs_f64())
        }
        Err(_) => {
            debug!("{} timed out after {:?}", program.display(), timeout);
            if let Err(e) = child.kill().await {
                warn!("cannot kill {}: {}", program.display(), e);
            }
            (Exit::TimedOut, timeout.as_secs_f64())
        }
    };
    if let Some(feeder) = feeder {
        feeder.abort();
    }
    let (out_abort, err_abort) = (stdout.abort_handle(), stderr.abort_handle());
    let (stdout, stderr) =
        match tokio::time::timeout(DRAIN_GRACE, futures::future::join(stdout, stderr)).await {
            Ok((out, err)) => (out.unwrap_or_default(), err.unwrap_or_default()),
            Err(_) => {
                // a grandchild may still hold the pipes open
                out_abort.abort();
                err_abort.abort();
                (Vec::new(), Vec::new())
            }
        };
    ProcessOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit,
        elapsed,
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        // keep what was read before the error
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("output pipe read failed after {} bytes: {}", buf.len(), e);
        }
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    fn sh(script: &str) -> (PathBuf, Vec<String>) {
        (
            PathBuf::from("/bin/sh"),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let (prog, args) = sh("cat; echo oops >&2; exit 3");
        let out = run(&prog, &args, Some(b"hello\n"), Duration::from_secs(10)).await;
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
        assert_eq!(out.exit, Exit::Exited(Some(3)));
        assert_eq!(out.exit.code(), Some(3));
        assert!(out.elapsed < 10.0);
    }

    #[tokio::test]
    async fn large_payload_does_not_block() {
        let payload = "x".repeat(1 << 20);
        let (prog, args) = sh("wc -c");
        let out = run(&prog, &args, Some(payload.as_bytes()), Duration::from_secs(30)).await;
        assert_eq!(out.exit, Exit::Exited(Some(0)));
        assert_eq!(out.stdout.trim(), (1 << 20).to_string());
    }

    #[tokio::test]
    async fn timeout_reports_the_limit() {
        let (prog, args) = sh("echo started; exec sleep 30");
        let out = run(&prog, &args, None, Duration::from_secs(1)).await;
        assert_eq!(out.exit, Exit::TimedOut);
        assert_eq!(out.elapsed, 1.0);
        assert_eq!(out.stdout, "started\n");
    }

    /// Yields one chunk, then fails.
    struct BrokenPipe(bool);

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.0 {
                return Poll::Ready(Err(io::Error::other("broken")));
            }
            self.0 = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn read_error_keeps_partial_output() {
        assert_eq!(drain(Some(BrokenPipe(false))).await, b"partial");
        assert!(drain::<BrokenPipe>(None).await.is_empty());
    }

    #[tokio::test]
    async fn launch_failure_is_data() {
        let out = run(
            Path::new("/nonexistent/solver"),
            &[],
            Some(b"p"),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(out.exit, Exit::LaunchFailed(_)));
        assert_eq!(out.elapsed, 0.0);
        assert!(out.stdout.is_empty());
    }
}
