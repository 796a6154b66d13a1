//! Seam over the external package utilities.

use super::error::ToolError;
use super::srpm::reject_traversal;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Marker `rpm` prints for a package without files of the requested kind
pub const NO_FILES_MARKER: &str = "(contains no files)";

/// Query format listing every file with its permission string
pub const MANIFEST_QUERY_FORMAT: &str = "[%{FILEMODES:perms} %{FILENAMES}\n]";

/// Read-only access to package archives.
#[async_trait]
pub trait PackageQuery: Send + Sync {
    /// Runs a query against `package` and returns the non-empty output lines.
    ///
    /// `args` are the query options, the package path is appended last.
    async fn query(&self, package: &Path, args: &[&str]) -> Result<Vec<String>, ToolError>;

    /// Extracts a single file from the archive and returns its raw bytes
    async fn extract_file(&self, package: &Path, file_path: &str) -> Result<Vec<u8>, ToolError>;
}

/// [`PackageQuery`] backed by `rpm`, `rpm2cpio` and `cpio`
#[derive(Debug, Clone)]
pub struct RpmCommand {
    rpm: String,
    rpm2cpio: String,
    cpio: String,
}

impl RpmCommand {
    pub fn new() -> Self {
        Self {
            rpm: "rpm".to_string(),
            rpm2cpio: "rpm2cpio".to_string(),
            cpio: "cpio".to_string(),
        }
    }
}

impl Default for RpmCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Member name as stored in the archive, e.g. `./usr/share/doc/README`
pub(crate) fn archive_member(file_path: &str) -> String {
    let trimmed = file_path.trim_start_matches("./").trim_start_matches('/');
    format!("./{}", trimmed)
}

fn command_failed(command: &str, err: impl std::fmt::Display) -> ToolError {
    ToolError::CommandFailed {
        command: command.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl PackageQuery for RpmCommand {
    async fn query(&self, package: &Path, args: &[&str]) -> Result<Vec<String>, ToolError> {
        debug!(package = %package.display(), ?args, "Running rpm query");

        let output = Command::new(&self.rpm)
            .args(args)
            .arg(package)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| command_failed(&self.rpm, e))?;

        if !output.status.success() {
            return Err(command_failed(
                &self.rpm,
                format!(
                    "exited with code {}: {}",
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim() == NO_FILES_MARKER {
            return Ok(Vec::new());
        }

        Ok(stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn extract_file(&self, package: &Path, file_path: &str) -> Result<Vec<u8>, ToolError> {
        reject_traversal(file_path)?;
        let member = archive_member(file_path);
        let scratch = tempfile::tempdir()?;

        debug!(
            package = %package.display(),
            member = %member,
            scratch = %scratch.path().display(),
            "Extracting file from package"
        );

        let mut rpm2cpio = Command::new(&self.rpm2cpio)
            .arg(package)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_failed(&self.rpm2cpio, e))?;

        let archive: Stdio = rpm2cpio
            .stdout
            .take()
            .ok_or_else(|| command_failed(&self.rpm2cpio, "stdout was not captured"))?
            .try_into()?;

        let cpio = Command::new(&self.cpio)
            .args(["-idm", "--quiet"])
            .arg(&member)
            .current_dir(scratch.path())
            .stdin(archive)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| command_failed(&self.cpio, e))?;

        let unpacked = rpm2cpio
            .wait_with_output()
            .await
            .map_err(|e| command_failed(&self.rpm2cpio, e))?;

        if !unpacked.status.success() {
            return Err(ToolError::ExtractionFailed {
                command: self.rpm2cpio.clone(),
                code: unpacked.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&unpacked.stderr).trim().to_string(),
            });
        }
        if !cpio.status.success() {
            return Err(ToolError::ExtractionFailed {
                command: self.cpio.clone(),
                code: cpio.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&cpio.stderr).trim().to_string(),
            });
        }

        let not_found = || ToolError::FileNotFound(format!("{} in {}", file_path, package.display()));

        // Archived symlinks may point anywhere on the host
        let extracted = scratch.path().join(member.trim_start_matches("./"));
        let Ok(resolved) = extracted.canonicalize() else {
            return Err(not_found());
        };
        if !resolved.starts_with(scratch.path().canonicalize()?) {
            return Err(ToolError::PathTraversalRejected(file_path.to_string()));
        }
        if !resolved.is_file() {
            return Err(not_found());
        }

        Ok(tokio::fs::read(&resolved).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_member() {
        assert_eq!(archive_member("/usr/share/doc/README"), "./usr/share/doc/README");
        assert_eq!(archive_member("./etc/foo.conf"), "./etc/foo.conf");
        assert_eq!(archive_member("usr/bin/tool"), "./usr/bin/tool");
    }

    #[tokio::test]
    async fn test_missing_binary_is_command_failure() {
        let rpm = RpmCommand {
            rpm: "definitely-not-an-rpm-binary".to_string(),
            ..RpmCommand::new()
        };
        let err = rpm
            .query(Path::new("/tmp/pkg.rpm"), &["-qp", "--qf", "%{NAME}"])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { .. }));
    }

    fn no_op_pipeline() -> RpmCommand {
        RpmCommand {
            rpm: "false".to_string(),
            rpm2cpio: "true".to_string(),
            cpio: "true".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_query_is_command_failure() {
        let err = no_op_pipeline()
            .query(Path::new("/tmp/pkg.rpm"), &["-qp", "--provides"])
            .await
            .unwrap_err();
        match err {
            ToolError::CommandFailed { command, message } => {
                assert_eq!(command, "false");
                assert!(message.starts_with("exited with code 1"), "got: {}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extract_rejects_parent_segments() {
        let err = no_op_pipeline()
            .extract_file(Path::new("/tmp/pkg.rpm"), "../../../../../../etc/hostname")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathTraversalRejected(_)));
    }

    #[tokio::test]
    async fn test_extract_never_reads_outside_scratch() {
        let err = no_op_pipeline()
            .extract_file(Path::new("/tmp/pkg.rpm"), "/etc/hostname")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(_)), "got: {:?}", err);
    }
}
