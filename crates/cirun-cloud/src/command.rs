//! Provider CLI wrapper
//!
//! Runs `aws`, `az` or `gcloud` as a subprocess and captures its output.

use crate::error::{CloudError, Result};
use serde::de::DeserializeOwned;
use std::process::Stdio;
use tokio::process::Command;

/// A provider command-line tool
#[derive(Debug, Clone)]
pub struct ExternalCli {
    program: String,
    install_hint: String,
}

impl ExternalCli {
    pub fn new(program: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            install_hint: install_hint.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool and return stdout
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CloudError::ToolNotFound {
                    tool: self.program.clone(),
                    hint: self.install_hint.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CloudError::CommandFailed {
                tool: self.program.clone(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run the tool and decode its JSON output
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.run(args).await?;
        serde_json::from_str(&output).map_err(|e| self.unexpected(e.to_string()))
    }

    /// First non-empty line printed by the tool's version command
    pub async fn version(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| self.unexpected("empty version output"))
    }

    pub fn unexpected(&self, detail: impl Into<String>) -> CloudError {
        CloudError::UnexpectedOutput {
            tool: self.program.clone(),
            detail: detail.into(),
        }
    }

    /// Turn a failed identity lookup into a `NotAuthenticated` error
    pub fn not_authenticated(&self, hint: &str) -> impl FnOnce(CloudError) -> CloudError {
        let tool = self.program.clone();
        let hint = hint.to_string();
        move |err| match err {
            CloudError::CommandFailed { stderr, .. } => CloudError::NotAuthenticated {
                tool,
                hint: format!("{hint}\n{stderr}"),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool() {
        let cli = ExternalCli::new("cirun-no-such-tool", "https://example.com/install");
        let err = cli.run(&["--version"]).await.unwrap_err();
        match err {
            CloudError::ToolNotFound { tool, hint } => {
                assert_eq!(tool, "cirun-no-such-tool");
                assert_eq!(hint, "https://example.com/install");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_json_and_failure() {
        let sh = ExternalCli::new("sh", "");

        let value: serde_json::Value = sh
            .run_json(&["-c", r#"echo '{"Account": "123456789012"}'"#])
            .await
            .unwrap();
        assert_eq!(value["Account"], "123456789012");

        let err = sh.run(&["-c", "echo denied >&2; exit 3"]).await.unwrap_err();
        match err {
            CloudError::CommandFailed { tool, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr, "denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_first_line() {
        let sh = ExternalCli::new("sh", "");
        let version = sh
            .version(&["-c", "printf '\\naws-cli/2.15.0 Python/3.11\\nextra\\n'"])
            .await
            .unwrap();
        assert_eq!(version, "aws-cli/2.15.0 Python/3.11");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_not_authenticated_mapping() {
        let sh = ExternalCli::new("sh", "");
        let err = sh
            .run(&["-c", "echo 'Please run az login' >&2; exit 1"])
            .await
            .map_err(sh.not_authenticated("Run `az login`"))
            .unwrap_err();
        match err {
            CloudError::NotAuthenticated { hint, .. } => {
                assert!(hint.starts_with("Run `az login`"));
                assert!(hint.contains("Please run az login"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
