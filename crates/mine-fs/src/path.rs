//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Install targets are derived from one base root by fixed relative offsets,
/// so all joins happen on the normalized form and conversion to the
/// platform-native form only happens at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = dunce::simplified(path.as_ref());
        let normalized = path.to_string_lossy().replace('\\', "/");
        Self { inner: normalized }
    }

    /// Resolve a user-supplied root to an absolute path.
    ///
    /// Existing directories are canonicalized; a root that does not exist yet
    /// is made absolute against the current directory instead.
    pub fn resolve(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match dunce::canonicalize(path) {
            Ok(canonical) => Self::new(canonical),
            Err(_) if path.is_absolute() => Self::new(path),
            Err(_) => match std::env::current_dir() {
                Ok(cwd) => Self::new(cwd.join(path)),
                Err(_) => Self::new(path),
            },
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a relative segment (which may contain `/`).
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches('/');
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Return a sibling path whose file name has `suffix` appended.
    pub fn with_name_suffix(&self, suffix: &str) -> Self {
        Self {
            inner: format!("{}{}", self.inner.trim_end_matches('/'), suffix),
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Validate a catalog-relative path such as `plan.md` or `review/SKILL.md`.
///
/// Rejects empty paths, absolute paths, backslashes, and `.`/`..` segments so
/// that no catalog entry can address anything outside its group root.
pub fn validate_relative_path(path: &str, what: &str) -> std::result::Result<(), String> {
    if path.trim().is_empty() {
        return Err(format!("{} must not be empty", what));
    }
    if path.starts_with('/') || path.contains('\\') || path.contains(':') {
        return Err(format!("{} must be a relative forward-slash path: {}", what, path));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(format!("{} contains an invalid segment: {}", what, path));
    }
    Ok(())
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
