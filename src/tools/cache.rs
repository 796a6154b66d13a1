use super::rpm::PackageManifest;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Package manifests keyed by absolute archive path.
///
/// Archives are assumed not to change while the process runs, so entries are
/// never invalidated.
#[derive(Clone)]
pub struct ManifestCache {
    cache: Arc<RwLock<HashMap<PathBuf, Arc<PackageManifest>>>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, package: &Path) -> Option<Arc<PackageManifest>> {
        self.cache.read().ok()?.get(package).cloned()
    }

    pub fn insert(&self, package: &Path, manifest: Arc<PackageManifest>) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(package.to_path_buf(), manifest);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ManifestCache {
    fn default() -> Self {
        Self::new()
    }
}
