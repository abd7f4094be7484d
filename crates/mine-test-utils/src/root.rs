//! [`TestRoot`]: a temporary home for one install target.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding a base root at `<temp>/windsurf`.
///
/// The base root's parent is where the shared instruction document and the
/// preferences file live, so relative paths given to the helpers here are
/// resolved against the temp directory itself, e.g. `"global_rules.md"` or
/// `"windsurf/global_workflows/plan.md"`. A local resource mirror can be
/// populated under `<temp>/mirror`.
pub struct TestRoot {
    temp_dir: TempDir,
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// The temp directory (parent of the base root).
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The install base root.
    pub fn base(&self) -> PathBuf {
        self.root().join("windsurf")
    }

    /// The local mirror directory used as a `--source`.
    pub fn mirror(&self) -> PathBuf {
        self.root().join("mirror")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` at `relative`, creating parents.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    /// Write a file into the local mirror.
    pub fn mirror_file(&self, relative: &str, content: impl AsRef<[u8]>) {
        self.write(&format!("mirror/{relative}"), content);
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }

    pub fn assert_contains(&self, relative: &str, needle: &str) {
        let content = self.read(relative);
        assert!(
            content.contains(needle),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            relative,
            needle,
            content
        );
    }

    /// Contents of every file under the temp directory, sorted by path.
    pub fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        collect(self.root(), &mut files);
        files.sort();
        files
    }
}

fn collect(dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
        } else if let Ok(bytes) = fs::read(&path) {
            out.push((path, bytes));
        }
    }
}
