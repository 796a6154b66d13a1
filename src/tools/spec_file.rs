use super::error::ToolError;
use super::text::{decode_text, existing_path};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Reads `.spec` files, by default at most once each unless forced.
#[derive(Debug)]
pub struct SpecReader {
    single_read: bool,
    read: Mutex<HashSet<PathBuf>>,
}

impl SpecReader {
    pub fn new(single_read: bool) -> Self {
        Self {
            single_read,
            read: Mutex::new(HashSet::new()),
        }
    }

    pub fn read(&self, spec_file: &str, force: bool) -> Result<String, ToolError> {
        let path = existing_path(spec_file)?;
        if path.extension().and_then(|e| e.to_str()) != Some("spec") {
            return Err(ToolError::InvalidArgument(format!(
                "'{}' is not a .spec file",
                spec_file
            )));
        }

        let mut read = self.read.lock().unwrap_or_else(PoisonError::into_inner);
        if self.single_read && !force && read.contains(&path) {
            return Err(ToolError::AlreadyRead(spec_file.to_string()));
        }

        let contents = decode_text(std::fs::read(&path)?, spec_file)?;
        read.insert(path);
        info!(spec = spec_file, bytes = contents.len(), forced = force, "Read spec file");
        Ok(contents)
    }
}

impl Default for SpecReader {
    fn default() -> Self {
        Self::new(true)
    }
}
