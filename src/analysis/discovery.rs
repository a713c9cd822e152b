// File discovery: find every file with a given name under a root

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds files named `target` under `root`, pruning excluded directory names
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    target: String,
    exclude_dirs: HashSet<String>,
}

impl FileDiscovery {
    pub fn new(root: &Path, target: &str, exclude_dirs: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            target: target.to_string(),
            exclude_dirs: exclude_dirs.iter().cloned().collect(),
        }
    }

    /// Walk the tree lazily. Each call starts a fresh walk.
    ///
    /// Yields matching paths in file-name order within each directory, and an
    /// `Err` for every subtree that could not be entered; the walk carries on
    /// past those.
    pub fn iter(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                // The root is never pruned, whatever its name
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_excluded(entry.file_name())
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && entry.file_name() == OsStr::new(&self.target) {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(Error::WalkDir(e))),
            })
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        name.to_str()
            .map_or(false, |name| self.exclude_dirs.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn default_excludes() -> Vec<String> {
        crate::config::DiscoveryConfig::default().exclude_dirs
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn found(discovery: &FileDiscovery, root: &Path) -> Vec<String> {
        discovery
            .iter()
            .filter_map(|r| r.ok())
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_finds_target_files_recursively() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "blog/models.py");
        touch(dir.path(), "shop/catalog/models.py");
        touch(dir.path(), "shop/views.py");
        touch(dir.path(), "models.py.bak");

        let discovery = FileDiscovery::new(dir.path(), "models.py", &default_excludes());
        assert_eq!(
            found(&discovery, dir.path()),
            vec!["blog/models.py", "shop/catalog/models.py"]
        );
    }

    #[test]
    fn test_excluded_dirs_are_pruned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app/models.py");
        touch(dir.path(), "venv/lib/site-packages/django/models.py");
        touch(dir.path(), ".venv/pkg/models.py");
        touch(dir.path(), "node_modules/x/models.py");
        touch(dir.path(), "app/__pycache__/models.py");

        let discovery = FileDiscovery::new(dir.path(), "models.py", &default_excludes());
        assert_eq!(found(&discovery, dir.path()), vec!["app/models.py"]);
    }

    #[test]
    fn test_directory_named_like_target_is_not_a_match() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("urls.py")).unwrap();
        touch(dir.path(), "urls.py/inner.py");

        let discovery = FileDiscovery::new(dir.path(), "urls.py", &default_excludes());
        assert!(found(&discovery, dir.path()).is_empty());
    }

    #[test]
    fn test_excluded_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("venv");
        touch(&root, "app/models.py");

        let discovery = FileDiscovery::new(&root, "models.py", &default_excludes());
        assert_eq!(found(&discovery, &root), vec!["app/models.py"]);
    }

    #[test]
    fn test_iter_is_restartable() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/urls.py");
        touch(dir.path(), "b/urls.py");

        let discovery = FileDiscovery::new(dir.path(), "urls.py", &default_excludes());
        let first = found(&discovery, dir.path());
        let second = found(&discovery, dir.path());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app/models.py");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("app/loop")).unwrap();

        let discovery = FileDiscovery::new(dir.path(), "models.py", &default_excludes());
        let results: Vec<_> = discovery.iter().collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| r.is_err()));
    }
}
