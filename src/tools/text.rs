use super::error::ToolError;
use std::path::{Path, PathBuf};

/// Resolves `path` against the working directory and checks that it exists.
pub(crate) fn existing_path(path: &str) -> Result<PathBuf, ToolError> {
    let candidate = Path::new(path);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        std::env::current_dir()?.join(candidate)
    };

    if !absolute.exists() {
        return Err(ToolError::FileNotFound(absolute.display().to_string()));
    }
    Ok(absolute)
}

pub(crate) fn positive_lines(max_lines: i64) -> Result<usize, ToolError> {
    if max_lines <= 0 {
        return Err(ToolError::InvalidArgument(
            "max_lines must be greater than 0".to_string(),
        ));
    }
    Ok(max_lines as usize)
}

pub(crate) fn depth_limit(max_depth: i64) -> Result<usize, ToolError> {
    if max_depth < 0 {
        return Err(ToolError::InvalidArgument(
            "max_depth must be greater than or equal to 0".to_string(),
        ));
    }
    Ok(max_depth as usize)
}

/// UTF-8 decode, refusing binary content
pub(crate) fn decode_text(bytes: Vec<u8>, label: &str) -> Result<String, ToolError> {
    String::from_utf8(bytes).map_err(|_| ToolError::NotTextFile(label.to_string()))
}

/// First `max_lines` lines, terminators kept
pub(crate) fn first_lines(text: &str, max_lines: usize) -> String {
    text.split_inclusive('\n').take(max_lines).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_lines_keeps_terminators() {
        let text = "one\ntwo\nthree\n";
        assert_eq!(first_lines(text, 2), "one\ntwo\n");
        assert_eq!(first_lines(text, 10), text);
        assert_eq!(first_lines("no newline", 1), "no newline");
    }

    #[test]
    fn test_decode_text_rejects_binary() {
        let err = decode_text(vec![0xff, 0xfe, 0x00], "/usr/bin/tool").unwrap_err();
        assert!(matches!(err, ToolError::NotTextFile(ref f) if f == "/usr/bin/tool"));
        assert_eq!(decode_text(b"MIT".to_vec(), "x").unwrap(), "MIT");
    }

    #[test]
    fn test_numeric_guards() {
        assert!(positive_lines(0).is_err());
        assert!(positive_lines(-3).is_err());
        assert_eq!(positive_lines(5).unwrap(), 5);
        assert!(depth_limit(-1).is_err());
        assert_eq!(depth_limit(0).unwrap(), 0);
    }

    #[test]
    fn test_existing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pkg.rpm");
        std::fs::write(&file, b"").unwrap();

        assert_eq!(existing_path(file.to_str().unwrap()).unwrap(), file);

        let missing = dir.path().join("missing.rpm");
        let err = existing_path(missing.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("File not found:"));
    }
}
