//! Utility functions for command implementation

use std::path::{Path, PathBuf};

/// The base directory (or current directory if None)
pub fn base_dir(base_path: Option<&str>) -> &Path {
    base_path.map(Path::new).unwrap_or_else(|| Path::new("."))
}

/// Resolve a path given on the command line against the base directory
pub fn resolve(base_path: Option<&str>, path: &str) -> PathBuf {
    match base_path {
        Some(base) => Path::new(base).join(path),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir(None), Path::new("."));
        assert_eq!(base_dir(Some("/work")), Path::new("/work"));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(None, "t/a.t"), PathBuf::from("t/a.t"));
        assert_eq!(resolve(Some("/work"), "t/a.t"), PathBuf::from("/work/t/a.t"));
    }
}
