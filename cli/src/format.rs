//! Go formatter invocation for generated output.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Upper bound on a single formatter run.
pub const FORMAT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}")]
    Failed { tool: String, status: ExitStatus },
    #[error("{tool} did not finish within {}s", timeout.as_secs())]
    TimedOut { tool: String, timeout: Duration },
}

/// The formatter used on output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatter {
    /// `goimports -w`, which also fixes the import block.
    Goimports(PathBuf),
    /// `gofmt -w`, used when goimports is not installed.
    Gofmt,
}

impl Formatter {
    /// Prefers goimports from `PATH`, then from `$GOPATH/bin` (or `~/go/bin`).
    pub fn detect() -> Self {
        if let Some(path) = find_on_path("goimports") {
            return Self::Goimports(path);
        }
        let gopath = env::var_os("GOPATH")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join("go")));
        if let Some(candidate) = gopath.map(|dir| dir.join("bin").join("goimports")) {
            if candidate.is_file() {
                return Self::Goimports(candidate);
            }
        }
        info!(
            "goimports not found, using gofmt (run 'go install golang.org/x/tools/cmd/goimports@latest' for better formatting)"
        );
        Self::Gofmt
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Goimports(_) => "goimports",
            Self::Gofmt => "gofmt",
        }
    }

    fn program(&self) -> &Path {
        match self {
            Self::Goimports(path) => path,
            Self::Gofmt => Path::new("gofmt"),
        }
    }

    /// Rewrites every Go file in `dir` in place.
    pub fn run(&self, dir: &Path, timeout: Duration) -> Result<(), FormatError> {
        let tool = self.name().to_string();
        debug!(tool = %tool, dir = %dir.display(), "Formatting generated files");

        let mut child = Command::new(self.program())
            .arg("-w")
            .arg(dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        match child.wait_timeout(timeout) {
            Ok(Some(status)) if status.success() => Ok(()),
            Ok(Some(status)) => Err(FormatError::Failed { tool, status }),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(FormatError::TimedOut { tool, timeout })
            }
            Err(source) => Err(FormatError::Spawn { tool, source }),
        }
    }
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_a_spawn_error() {
        let formatter = Formatter::Goimports(PathBuf::from("/nonexistent/bin/goimports"));
        let dir = tempfile::tempdir().unwrap();
        let err = formatter.run(dir.path(), FORMAT_TIMEOUT).unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
        assert!(err.to_string().starts_with("failed to start goimports"));
    }
}
