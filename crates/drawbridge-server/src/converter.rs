//! Out-of-process diagram converter.
//!
//! Runs a configured command per conversion: the diagram goes in on stdin,
//! a JSON `{"elements": [...], "logs": [...]}` object comes back on stdout.

use drawbridge_core::converter::{
    BoxFuture, ConvertedDiagram, ConverterError, ConverterResult, DiagramConverter,
};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ProcessConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Build from a program-then-arguments list. `None` if the list is empty.
    pub fn from_command(command: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec(), timeout))
    }

    async fn run(&self, diagram: &str) -> ConverterResult<ConvertedDiagram> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConverterError::Unavailable(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(diagram.as_bytes()).await {
                Ok(()) => {}
                // The converter may exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(ConverterError::Failed(format!("writing diagram: {}", e))),
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ConverterError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(ConverterError::Failed(if message.is_empty() {
                format!("converter exited with {}", output.status)
            } else {
                message.to_string()
            }));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ConverterError::Malformed(e.to_string()))
    }
}

impl DiagramConverter for ProcessConverter {
    fn convert<'a>(&'a self, diagram: &'a str) -> BoxFuture<'a, ConverterResult<ConvertedDiagram>> {
        Box::pin(async move {
            tracing::debug!("Running converter {}", self.program);
            match tokio::time::timeout(self.timeout, self.run(diagram)).await {
                Ok(result) => result,
                // Dropping the future drops the child, which kills it.
                Err(_) => Err(ConverterError::Timeout(self.timeout)),
            }
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell(script: &str, timeout: Duration) -> ProcessConverter {
        ProcessConverter::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_converts_stdout_json() {
        let converter = shell(
            r#"cat > /dev/null; echo '{"elements": [{"type": "rectangle", "x": 0, "y": 0}], "logs": ["ok"]}'"#,
            Duration::from_secs(10),
        );
        let converted = converter.convert("graph TD; A-->B").await.unwrap();
        assert_eq!(converted.elements, vec![json!({"type": "rectangle", "x": 0, "y": 0})]);
        assert_eq!(converted.logs, vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_diagram_reaches_stdin() {
        let converter = shell(
            r#"read line; printf '{"elements": [], "logs": ["%s"]}' "$line""#,
            Duration::from_secs(10),
        );
        let converted = converter.convert("graph LR\n").await.unwrap();
        assert_eq!(converted.logs, vec!["graph LR".to_string()]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let converter = shell("echo 'bad diagram' >&2; exit 3", Duration::from_secs(10));
        let err = converter.convert("nope").await.unwrap_err();
        assert!(matches!(err, ConverterError::Failed(msg) if msg == "bad diagram"));
    }

    #[tokio::test]
    async fn test_garbage_output_is_malformed() {
        let converter = shell("cat > /dev/null; echo not-json", Duration::from_secs(10));
        let err = converter.convert("graph TD").await.unwrap_err();
        assert!(matches!(err, ConverterError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let converter = shell("sleep 5", Duration::from_millis(100));
        let err = converter.convert("graph TD").await.unwrap_err();
        assert!(matches!(err, ConverterError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let converter = ProcessConverter::new(
            "/nonexistent/drawbridge-converter",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = converter.convert("graph TD").await.unwrap_err();
        assert!(matches!(err, ConverterError::Unavailable(_)));
    }

    #[test]
    fn test_from_command() {
        let timeout = Duration::from_secs(1);
        assert!(ProcessConverter::from_command(&[], timeout).is_none());
        let converter =
            ProcessConverter::from_command(&["node".to_string(), "conv.js".to_string()], timeout)
                .unwrap();
        assert_eq!(converter.program, "node");
        assert_eq!(converter.args, vec!["conv.js".to_string()]);
    }
}
