//! Finding test files - directory discovery and --load-list files

use regex::Regex;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Parse a test list file into a vector of test file paths
///
/// The file should contain one path per line. Empty lines, lines starting
/// with `#` and leading/trailing whitespace are ignored.
pub fn parse_list_file(path: &Path) -> io::Result<Vec<PathBuf>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            paths.push(PathBuf::from(trimmed));
        }
    }

    Ok(paths)
}

/// Parse a test list from a string
pub fn parse_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

/// Expand directories into the test files they contain
///
/// Directories are searched recursively for files whose name matches
/// `pattern`; the matches of each directory are sorted. Other paths are kept
/// as given, even if they do not exist, so the harness can report them.
pub fn discover(paths: &[PathBuf], pattern: &Regex) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut matches = Vec::new();
            walk(path, pattern, &mut matches)?;
            matches.sort();
            tracing::debug!(dir = %path.display(), count = matches.len(), "discovered test files");
            found.extend(matches);
        } else {
            found.push(path.clone());
        }
    }
    Ok(found)
}

fn walk(dir: &Path, pattern: &Regex, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&path, pattern, found)?;
        } else if pattern.is_match(&entry.file_name().to_string_lossy()) {
            found.push(path);
        }
    }
    Ok(())
}
