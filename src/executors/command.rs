/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 08/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use crate::tools::errors::ExecutorError;
use crate::tools::invocation::InvocationRequest;
use crate::tools::process::Executor;
use crate::tools::results::InvocationResult;
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs each invocation in a child engine process. The request is written
/// to the child's stdin as JSON and the result is read back from stdout.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    engine_path: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    cancel: Arc<Mutex<bool>>,
}

impl CommandExecutor {
    pub fn new<P: Into<PathBuf>>(engine_path: P) -> CommandExecutor {
        CommandExecutor {
            engine_path: engine_path.into(),
            args: vec![],
            working_dir: None,
            timeout: None,
            cancel: Arc::new(Mutex::new(false)),
        }
    }

    /// Extra arguments passed to the engine ahead of the request.
    pub fn args<I, S>(mut self, args: I) -> CommandExecutor
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn working_dir<P: Into<PathBuf>>(mut self, dir: P) -> CommandExecutor {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> CommandExecutor {
        self.timeout = timeout;
        self
    }

    /// Flag polled while the engine runs; setting it kills the child.
    pub fn cancel_flag(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        if let Ok(mut cancel) = self.cancel.lock() {
            *cancel = true;
        }
    }

    fn take_cancel(&self) -> bool {
        match self.cancel.lock() {
            Ok(mut cancel) if *cancel => {
                *cancel = false; // reset the cancel.
                true
            }
            _ => false,
        }
    }

    fn spawn(&self) -> Result<Child, ExecutorError> {
        let mut command = Command::new(&self.engine_path);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command.spawn().map_err(|e| {
            ExecutorError::Transport(format!(
                "unable to start engine {}: {}",
                self.engine_path.display(),
                e
            ))
        })
    }

    /// Waits for the child, honouring the cancel flag and the deadline.
    fn wait(&self, child: &mut Child) -> Result<std::process::ExitStatus, ExecutorError> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.take_cancel() {
                log::info!("cancelling {}", self.engine_path.display());
                child.kill()?;
                child.wait()?;
                return Err(ExecutorError::Cancelled);
            }
            if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    child.kill()?;
                    child.wait()?;
                    return Err(ExecutorError::DeadlineExceeded(timeout));
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = vec![];
        if let Some(mut pipe) = pipe {
            // a read error leaves whatever was collected so far
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Writes the request on its own thread; `wait` polls the cancel flag and
/// the deadline while it is pending.
fn feed<W: Write + Send + 'static>(pipe: Option<W>, payload: Vec<u8>) -> JoinHandle<std::io::Result<()>> {
    thread::spawn(move || {
        let mut pipe = match pipe {
            Some(pipe) => pipe,
            None => return Ok(()),
        };
        match pipe.write_all(&payload) {
            // the engine may exit without reading its input
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    })
}

impl Executor for CommandExecutor {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError> {
        let payload = request.to_payload()?;
        let mut child = self.spawn()?;
        log::debug!("started engine {} for {}", self.engine_path.display(), request.tool);

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let stdin = feed(child.stdin.take(), payload);

        let status = self.wait(&mut child)?;
        stdin
            .join()
            .map_err(|_| ExecutorError::Transport("stdin writer panicked".to_string()))??;
        let stdout = stdout
            .join()
            .map_err(|_| ExecutorError::Transport("stdout reader panicked".to_string()))?;
        let stderr = stderr
            .join()
            .map_err(|_| ExecutorError::Transport("stderr reader panicked".to_string()))?;

        if !status.success() {
            let mut messages: Vec<String> = String::from_utf8_lossy(&stderr)
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.to_string())
                .collect();
            if messages.is_empty() {
                messages.push(format!("engine exited with {}", status));
            }
            return Err(ExecutorError::ToolFailed { messages });
        }

        Ok(serde_json::from_slice(&stdout)?)
    }
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use crate::tools::invocation::WireValue;
    use crate::tools::results::ExecutionStatus;
    use std::collections::BTreeMap;

    fn request() -> InvocationRequest {
        InvocationRequest {
            tool: "management.FeatureCompare".to_string(),
            parameters: vec![WireValue::Text("a".to_string()), WireValue::Empty],
            environment: BTreeMap::new(),
        }
    }

    fn sh(script: &str) -> CommandExecutor {
        CommandExecutor::new("sh").args(["-c", script])
    }

    #[test]
    fn test_reads_result_from_stdout() {
        let executor = sh(r#"cat > /dev/null; echo '{"status":"succeeded","values":["true"]}'"#);
        let result = executor.submit(&request()).unwrap();
        assert_eq!(result.status, ExecutionStatus::Succeeded);
        assert_eq!(result.values, vec![WireValue::Text("true".to_string())]);
    }

    #[test]
    fn test_request_is_written_to_stdin() {
        // echoes the tool name back as the single output value
        let executor = sh(
            r#"tool=$(sed -e 's/.*"tool":"\([^"]*\)".*/\1/'); printf '{"status":"succeeded","values":["%s"]}' "$tool""#,
        );
        let result = executor.submit(&request()).unwrap();
        assert_eq!(
            result.values,
            vec![WireValue::Text("management.FeatureCompare".to_string())]
        );
    }

    #[test]
    fn test_non_zero_exit_is_tool_failure() {
        let executor = sh("echo 'ERROR 000732: dataset does not exist' >&2; exit 3");
        match executor.submit(&request()) {
            Err(ExecutorError::ToolFailed { messages }) => {
                assert_eq!(messages, vec!["ERROR 000732: dataset does not exist"])
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_output_is_a_protocol_error() {
        let executor = sh("echo 'not json'");
        assert!(matches!(
            executor.submit(&request()),
            Err(ExecutorError::Protocol(_))
        ));
    }

    #[test]
    fn test_deadline_kills_the_engine() {
        let executor = sh("sleep 5").timeout(Some(Duration::from_millis(100)));
        assert!(matches!(
            executor.submit(&request()),
            Err(ExecutorError::DeadlineExceeded(_))
        ));
    }

    #[test]
    fn test_deadline_holds_when_the_engine_ignores_a_large_request() {
        let mut request = request();
        request.parameters = vec![WireValue::Text("x".repeat(2 << 20))];
        let executor = sh("sleep 3").timeout(Some(Duration::from_millis(100)));
        let start = Instant::now();
        assert!(matches!(
            executor.submit(&request),
            Err(ExecutorError::DeadlineExceeded(_))
        ));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_cancel_flag_kills_the_engine() {
        let executor = sh("sleep 5");
        let flag = executor.cancel_flag();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            *flag.lock().unwrap() = true;
        });
        assert!(matches!(executor.submit(&request()), Err(ExecutorError::Cancelled)));
        handle.join().unwrap();
        assert!(!*executor.cancel_flag().lock().unwrap());
    }

    #[test]
    fn test_missing_engine_is_a_transport_error() {
        let executor = CommandExecutor::new("/nonexistent/engine");
        assert!(matches!(
            executor.submit(&request()),
            Err(ExecutorError::Transport(_))
        ));
    }
}
