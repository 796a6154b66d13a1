//! Exploded source trees: the prepared `BUILD` directory of a source package.

use super::error::ToolError;
use super::text::{decode_text, depth_limit, existing_path, first_lines, positive_lines};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Rejects any requested path that contains a `..` segment.
///
/// Pure string check, no filesystem access.
pub fn reject_traversal(requested: &str) -> Result<(), ToolError> {
    if requested.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ToolError::PathTraversalRejected(requested.to_string()));
    }
    Ok(())
}

/// Joins a requested relative path onto `root`, rejecting traversal.
pub fn sanitize_path(root: &Path, requested: &str) -> Result<PathBuf, ToolError> {
    reject_traversal(requested)?;

    let mut resolved = root.to_path_buf();
    for component in Path::new(requested).components() {
        if let Component::Normal(part) = component {
            resolved.push(part);
        }
    }
    Ok(resolved)
}

/// Resolves symlinks in `target` and rejects it unless it stays under `root`.
pub fn contain_path(root: &Path, target: &Path, requested: &str) -> Result<PathBuf, ToolError> {
    let root = root.canonicalize()?;
    let resolved = match target.canonicalize() {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::FileNotFound(target.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !resolved.starts_with(&root) {
        warn!(
            requested = requested,
            resolved = %resolved.display(),
            "Rejected path resolving outside the build tree"
        );
        return Err(ToolError::PathTraversalRejected(requested.to_string()));
    }
    Ok(resolved)
}

/// Maps source packages to their exploded build directories.
#[derive(Debug, Default)]
pub struct BuildTrees {
    default_root: Option<PathBuf>,
    registered: RwLock<HashMap<PathBuf, PathBuf>>,
}

impl BuildTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build directory used for any source package without its own entry
    pub fn with_default_root(root: impl Into<PathBuf>) -> Self {
        Self {
            default_root: Some(root.into()),
            registered: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, srpm: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) {
        if let Ok(mut registered) = self.registered.write() {
            registered.insert(srpm.into(), build_dir.into());
        }
    }

    pub fn resolve(&self, srpm: &Path) -> Result<PathBuf, ToolError> {
        let registered = self
            .registered
            .read()
            .ok()
            .and_then(|r| r.get(srpm).cloned());

        registered
            .or_else(|| self.default_root.clone())
            .filter(|root| root.is_dir())
            .ok_or_else(|| ToolError::NoBuildTree(srpm.display().to_string()))
    }

    pub fn explore(
        &self,
        srpm_file: &str,
        search_dir: &str,
        max_depth: i64,
    ) -> Result<Vec<String>, ToolError> {
        reject_traversal(search_dir)?;
        let srpm = existing_path(srpm_file)?;
        let max_depth = depth_limit(max_depth)?;

        let root = self.resolve(&srpm)?;
        let start = contain_path(&root, &sanitize_path(&root, search_dir)?, search_dir)?;
        if !start.is_dir() {
            return Err(ToolError::FileNotFound(start.display().to_string()));
        }

        let mut walker = WalkDir::new(&start).min_depth(1).sort_by_file_name();
        if max_depth > 0 {
            walker = walker.max_depth(max_depth);
        }

        let mut entries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry in build tree");
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(&start) else {
                continue;
            };
            let relative = relative.to_string_lossy();
            if entry.file_type().is_dir() {
                entries.push(format!("dir:{}/", relative));
            } else {
                entries.push(format!("file:{}", relative));
            }
        }

        entries.sort_by(|a, b| untagged(a).cmp(untagged(b)));
        debug!(
            srpm = %srpm.display(),
            start = %start.display(),
            entries = entries.len(),
            "Explored build tree"
        );
        Ok(entries)
    }

    pub fn read_file(
        &self,
        srpm_file: &str,
        file_path: &str,
        max_lines: i64,
    ) -> Result<String, ToolError> {
        reject_traversal(file_path)?;
        let srpm = existing_path(srpm_file)?;
        let max_lines = positive_lines(max_lines)?;

        let root = self.resolve(&srpm)?;
        let target = contain_path(&root, &sanitize_path(&root, file_path)?, file_path)?;
        if !target.is_file() {
            return Err(ToolError::FileNotFound(target.display().to_string()));
        }

        let text = decode_text(std::fs::read(&target)?, file_path)?;
        Ok(first_lines(&text, max_lines))
    }
}

fn untagged(entry: &str) -> &str {
    entry.split_once(':').map(|(_, path)| path).unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        srpm: String,
        trees: BuildTrees,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let srpm = dir.path().join("tool-1.0-1.src.rpm");
        fs::write(&srpm, b"").unwrap();

        let build = dir.path().join("BUILD");
        fs::create_dir_all(build.join("tool-1.0/src/vendor")).unwrap();
        fs::write(build.join("tool-1.0/COPYING"), "GPL\nline2\nline3\n").unwrap();
        fs::write(build.join("tool-1.0/src/main.c"), "int main;\n").unwrap();
        fs::write(build.join("tool-1.0/src/vendor/LICENSE"), "MIT\n").unwrap();

        Fixture {
            srpm: srpm.to_string_lossy().into_owned(),
            trees: BuildTrees::with_default_root(build),
            _dir: dir,
        }
    }

    #[test]
    fn test_reject_traversal() {
        assert!(reject_traversal("../etc").is_err());
        assert!(reject_traversal("a/../../b").is_err());
        assert!(reject_traversal("a\\..\\b").is_err());
        assert!(reject_traversal("a/..b/c").is_ok());
        assert!(reject_traversal(".").is_ok());
    }

    #[test]
    fn test_sanitize_path_stays_under_root() {
        let root = Path::new("/build");
        assert_eq!(sanitize_path(root, "./src/x.c").unwrap(), Path::new("/build/src/x.c"));
        assert_eq!(sanitize_path(root, "/src").unwrap(), Path::new("/build/src"));
        assert_eq!(sanitize_path(root, ".").unwrap(), Path::new("/build"));
    }

    #[test]
    fn test_explore_depth_limited() {
        let f = fixture();
        let entries = f.trees.explore(&f.srpm, ".", 2).unwrap();
        assert_eq!(
            entries,
            vec![
                "dir:tool-1.0/",
                "file:tool-1.0/COPYING",
                "dir:tool-1.0/src/",
            ]
        );
    }

    #[test]
    fn test_explore_unlimited() {
        let f = fixture();
        let entries = f.trees.explore(&f.srpm, "tool-1.0/src", 0).unwrap();
        assert_eq!(
            entries,
            vec!["file:main.c", "dir:vendor/", "file:vendor/LICENSE"]
        );
    }

    #[test]
    fn test_explore_rejects_traversal_before_touching_disk() {
        let trees = BuildTrees::new();
        let err = trees
            .explore("/definitely/not/here.src.rpm", "../..", 1)
            .unwrap_err();
        assert!(matches!(err, ToolError::PathTraversalRejected(_)));
    }

    #[test]
    fn test_read_file_truncates() {
        let f = fixture();
        let text = f.trees.read_file(&f.srpm, "tool-1.0/COPYING", 2).unwrap();
        assert_eq!(text, "GPL\nline2\n");
    }

    #[test]
    fn test_read_missing_file() {
        let f = fixture();
        let err = f.trees.read_file(&f.srpm, "tool-1.0/NOPE", 2).unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(_)));
    }

    #[test]
    fn test_no_build_tree() {
        let f = fixture();
        let trees = BuildTrees::new();
        let err = trees.explore(&f.srpm, ".", 1).unwrap_err();
        assert!(matches!(err, ToolError::NoBuildTree(_)));
    }

    #[test]
    fn test_registered_tree_wins() {
        let f = fixture();
        let other = TempDir::new().unwrap();
        fs::write(other.path().join("NOTICE"), "notice\n").unwrap();

        f.trees.register(PathBuf::from(&f.srpm), other.path());
        assert_eq!(f.trees.explore(&f.srpm, ".", 0).unwrap(), vec!["file:NOTICE"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_tree_is_rejected() {
        use std::os::unix::fs::symlink;

        let f = fixture();
        let build = f._dir.path().join("BUILD");
        let outside = f._dir.path().join("host-secret");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("hostname"), "vm\n").unwrap();
        symlink(outside.join("hostname"), build.join("LICENSE")).unwrap();
        symlink(&outside, build.join("escape")).unwrap();

        let err = f.trees.read_file(&f.srpm, "LICENSE", 5).unwrap_err();
        assert!(matches!(err, ToolError::PathTraversalRejected(_)), "got: {:?}", err);

        let err = f.trees.read_file(&f.srpm, "escape/hostname", 5).unwrap_err();
        assert!(matches!(err, ToolError::PathTraversalRejected(_)), "got: {:?}", err);

        let err = f.trees.explore(&f.srpm, "escape", 0).unwrap_err();
        assert!(matches!(err, ToolError::PathTraversalRejected(_)), "got: {:?}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_tree_is_followed() {
        use std::os::unix::fs::symlink;

        let f = fixture();
        let build = f._dir.path().join("BUILD");
        symlink(build.join("tool-1.0/COPYING"), build.join("LICENSE")).unwrap();

        let text = f.trees.read_file(&f.srpm, "LICENSE", 1).unwrap();
        assert_eq!(text, "GPL\n");
    }
}
