//! Inspection of binary packages: listing, name, dependencies and file reads.

use super::cache::ManifestCache;
use super::error::ToolError;
use super::query::{PackageQuery, MANIFEST_QUERY_FORMAT};
use super::srpm::reject_traversal;
use super::text::{decode_text, depth_limit, existing_path, first_lines, positive_lines};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Category of a listed package entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    License,
    Documentation,
    File,
}

impl EntryKind {
    pub fn tag(&self) -> &'static str {
        match self {
            EntryKind::Directory => "dir:",
            EntryKind::License => "license:",
            EntryKind::Documentation => "doc:",
            EntryKind::File => "file:",
        }
    }
}

/// Normalises an in-package path: repeated separators and `.` segments are
/// dropped and `..` pops the previous component.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Components of `path` below `dir`, or `None` when `path` is not inside it
fn components_below<'a>(path: &'a str, dir: &str) -> Option<Vec<&'a str>> {
    let rest = if dir == "/" {
        path.strip_prefix('/')?
    } else if path == dir {
        ""
    } else {
        path.strip_prefix(dir)?.strip_prefix('/')?
    };

    Some(rest.split('/').filter(|s| !s.is_empty()).collect())
}

/// The file manifest of one package, cross-referenced with its declared
/// license and documentation files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    paths: Vec<String>,
    directories: HashSet<String>,
    licenses: HashSet<String>,
    docs: HashSet<String>,
}

impl PackageManifest {
    /// Builds a manifest from `<perms> <path>` lines plus the license and doc file lists
    pub fn from_query(mode_lines: Vec<String>, licenses: Vec<String>, docs: Vec<String>) -> Self {
        let mut paths = Vec::with_capacity(mode_lines.len());
        let mut directories = HashSet::new();

        for line in &mode_lines {
            let Some((perms, path)) = line.trim().split_once(' ') else {
                continue;
            };
            let path = normalize_path(path.trim());
            if perms.starts_with('d') {
                directories.insert(path.clone());
            }
            paths.push(path);
        }

        Self {
            paths,
            directories,
            licenses: licenses.iter().map(|p| normalize_path(p.trim())).collect(),
            docs: docs.iter().map(|p| normalize_path(p.trim())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn classify(&self, path: &str) -> EntryKind {
        if self.directories.contains(path) {
            EntryKind::Directory
        } else if self.licenses.contains(path) {
            EntryKind::License
        } else if self.docs.contains(path) {
            EntryKind::Documentation
        } else {
            EntryKind::File
        }
    }

    /// Tagged entries under `search_dir`, sorted by path.
    ///
    /// With a non-zero `max_depth`, deeper entries are cut to that depth and
    /// suffixed with `/...`; the resulting duplicates collapse into one entry.
    pub fn listing(&self, search_dir: &str, max_depth: usize) -> Vec<String> {
        let search_dir = normalize_path(search_dir);

        let entries: BTreeSet<String> = self
            .paths
            .iter()
            .filter_map(|path| {
                let components = components_below(path, &search_dir)?;
                Some(self.render(path, &search_dir, &components, max_depth))
            })
            .collect();

        let mut entries: Vec<String> = entries.into_iter().collect();
        entries.sort_by(|a, b| untagged(a).cmp(untagged(b)));
        entries
    }

    fn render(&self, path: &str, search_dir: &str, components: &[&str], max_depth: usize) -> String {
        let pruned = max_depth > 0 && components.len() > max_depth;
        let kept = if pruned {
            &components[..max_depth]
        } else {
            components
        };

        let mut rendered = if kept.is_empty() {
            search_dir.to_string()
        } else if search_dir == "/" {
            format!("/{}", kept.join("/"))
        } else {
            format!("{}/{}", search_dir, kept.join("/"))
        };
        if pruned {
            rendered.push_str("/...");
        }

        format!("{}{}", self.classify(path).tag(), rendered)
    }
}

fn untagged(entry: &str) -> &str {
    entry.split_once(':').map(|(_, path)| path).unwrap_or(entry)
}

/// Binary package handlers
pub struct RpmInspector {
    query: Arc<dyn PackageQuery>,
    cache: ManifestCache,
}

impl RpmInspector {
    pub fn new(query: Arc<dyn PackageQuery>) -> Self {
        Self {
            query,
            cache: ManifestCache::new(),
        }
    }

    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    pub async fn list_contents(
        &self,
        rpm_file: &str,
        search_dir: &str,
        max_depth: i64,
    ) -> Result<Vec<String>, ToolError> {
        let package = existing_path(rpm_file)?;
        let max_depth = depth_limit(max_depth)?;

        let manifest = self.manifest(&package).await?;
        let entries = manifest.listing(search_dir, max_depth);
        debug!(
            package = %package.display(),
            search_dir,
            max_depth,
            entries = entries.len(),
            "Listed package contents"
        );
        Ok(entries)
    }

    async fn manifest(&self, package: &Path) -> Result<Arc<PackageManifest>, ToolError> {
        if let Some(cached) = self.cache.get(package) {
            debug!(package = %package.display(), "Package manifest found in cache");
            return Ok(cached);
        }

        let files = self
            .query
            .query(package, &["-qp", "--qf", MANIFEST_QUERY_FORMAT])
            .await?;
        let licenses = self.query.query(package, &["-qpL"]).await?;
        let docs = self.query.query(package, &["-qpd"]).await?;

        let manifest = Arc::new(PackageManifest::from_query(files, licenses, docs));
        info!(
            package = %package.display(),
            files = manifest.len(),
            "Loaded package manifest"
        );
        self.cache.insert(package, Arc::clone(&manifest));
        Ok(manifest)
    }

    pub async fn package_name(&self, rpm_file: &str) -> Result<String, ToolError> {
        let package = existing_path(rpm_file)?;
        let lines = self.query.query(&package, &["-qp", "--qf", "%{NAME}"]).await?;

        lines
            .into_iter()
            .next()
            .map(|name| name.trim().to_string())
            .ok_or_else(|| ToolError::CommandFailed {
                command: "rpm".to_string(),
                message: format!("no package name reported for {}", package.display()),
            })
    }

    pub async fn dependency_info(&self, rpm_file: &str) -> Result<Vec<String>, ToolError> {
        let package = existing_path(rpm_file)?;

        let mut provides = self.query.query(&package, &["-qp", "--provides"]).await?;
        let mut requires = self.query.query(&package, &["-qp", "--requires"]).await?;
        provides.sort();
        requires.sort();

        Ok(provides
            .iter()
            .map(|p| format!("provides:{}", p.trim()))
            .chain(requires.iter().map(|r| format!("requires:{}", r.trim())))
            .collect())
    }

    pub async fn read_file(
        &self,
        rpm_file: &str,
        file_path: &str,
        max_lines: i64,
    ) -> Result<String, ToolError> {
        reject_traversal(file_path)?;
        let package = existing_path(rpm_file)?;
        let max_lines = positive_lines(max_lines)?;

        let bytes = self.query.extract_file(&package, file_path).await?;
        let text = decode_text(bytes, file_path)?;
        Ok(first_lines(&text, max_lines))
    }
}
