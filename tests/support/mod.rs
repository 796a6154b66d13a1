//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use license_assistant::tools::{PackageQuery, ToolError, MANIFEST_QUERY_FORMAT};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Canned package metadata answered in place of the `rpm` tools
#[derive(Default)]
pub struct FakeRpm {
    pub name: String,
    pub manifest: Vec<String>,
    pub licenses: Vec<String>,
    pub docs: Vec<String>,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub files: HashMap<String, Vec<u8>>,
    queries: AtomicUsize,
}

impl FakeRpm {
    /// A small package with one binary, a README and a license file
    pub fn tool() -> Self {
        let mut files = HashMap::new();
        files.insert(
            "/usr/share/licenses/tool/LICENSE".to_string(),
            b"MIT License\n\nCopyright (c) 2024 Tool Authors\n\nPermission is hereby granted\n"
                .to_vec(),
        );
        files.insert("/usr/bin/tool".to_string(), vec![0x7f, b'E', b'L', b'F', 0xff, 0xfe]);

        Self {
            name: "tool".to_string(),
            manifest: vec![
                "-rwxr-xr-x /usr/bin/tool".to_string(),
                "-rw-r--r-- /usr/share/doc/tool/README".to_string(),
                "-rw-r--r-- /usr/share/licenses/tool/LICENSE".to_string(),
            ],
            licenses: vec!["/usr/share/licenses/tool/LICENSE".to_string()],
            docs: vec!["/usr/share/doc/tool/README".to_string()],
            provides: vec!["tool = 1.0-1".to_string(), "tool(x86-64) = 1.0-1".to_string()],
            requires: vec!["libc.so.6()(64bit)".to_string(), "/bin/sh".to_string()],
            files,
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageQuery for FakeRpm {
    async fn query(&self, _package: &Path, args: &[&str]) -> Result<Vec<String>, ToolError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let lines = match args {
            ["-qp", "--qf", format] if *format == MANIFEST_QUERY_FORMAT => self.manifest.clone(),
            ["-qp", "--qf", "%{NAME}"] => vec![self.name.clone()],
            ["-qpL"] => self.licenses.clone(),
            ["-qpd"] => self.docs.clone(),
            ["-qp", "--provides"] => self.provides.clone(),
            ["-qp", "--requires"] => self.requires.clone(),
            other => {
                return Err(ToolError::CommandFailed {
                    command: "rpm".to_string(),
                    message: format!("unexpected query {:?}", other),
                })
            }
        };
        Ok(lines)
    }

    async fn extract_file(&self, _package: &Path, file_path: &str) -> Result<Vec<u8>, ToolError> {
        let key = format!("/{}", file_path.trim_start_matches("./").trim_start_matches('/'));
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| ToolError::ExtractionFailed {
                command: "cpio".to_string(),
                code: 2,
                stderr: format!("{}: not found in archive", file_path),
            })
    }
}

/// Empty stand-ins for the package files named in prompts and tool calls
pub struct PackageFiles {
    pub dir: TempDir,
    pub rpm: PathBuf,
    pub srpm: PathBuf,
    pub spec: PathBuf,
}

impl PackageFiles {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let rpm = dir.path().join("tool-1.0-1.x86_64.rpm");
        let srpm = dir.path().join("tool-1.0-1.src.rpm");
        let spec = dir.path().join("tool.spec");
        std::fs::write(&rpm, b"").unwrap();
        std::fs::write(&srpm, b"").unwrap();
        std::fs::write(&spec, "Name: tool\nLicense: MIT\n").unwrap();
        Self { dir, rpm, srpm, spec }
    }

    pub fn rpm_str(&self) -> String {
        self.rpm.to_string_lossy().into_owned()
    }

    pub fn srpm_str(&self) -> String {
        self.srpm.to_string_lossy().into_owned()
    }

    pub fn all(&self) -> Vec<PathBuf> {
        vec![self.rpm.clone(), self.srpm.clone(), self.spec.clone()]
    }

    /// Creates an exploded build tree next to the packages and returns its root
    pub fn build_tree(&self) -> PathBuf {
        let build = self.dir.path().join("BUILD");
        std::fs::create_dir_all(build.join("tool-1.0/vendor/json")).unwrap();
        std::fs::write(build.join("tool-1.0/COPYING"), "MIT License\n").unwrap();
        std::fs::write(build.join("tool-1.0/vendor/json/LICENSE"), "BSD-3-Clause\n").unwrap();
        std::fs::write(build.join("tool-1.0/main.c"), "int main(void) { return 0; }\n").unwrap();
        build
    }
}
