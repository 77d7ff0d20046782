//! Template discovery under a root directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::{Pattern, PatternError};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Compile the file-name pattern `*<marker>*`
pub fn marker_pattern(marker: &str) -> Result<Pattern, PatternError> {
    Pattern::new(&format!("*{}*", Pattern::escape(marker)))
}

/// Discover template files under `root`, including files directly in `root`.
///
/// Only regular files (after following symlinks) whose base name matches
/// `pattern` are returned. Entries that cannot be read are skipped.
#[must_use = "this returns the discovered templates which should be processed"]
pub fn discover_templates(root: &Path, pattern: &Pattern) -> Vec<PathBuf> {
    let found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name))
        })
        .map(|entry| entry.into_path())
        .collect();

    debug!("Found {} template(s) under {}", found.len(), root.display());
    dedupe_paths(found)
}

/// Drop paths that name the same template, keeping the first occurrence.
///
/// Only the directory part is resolved, so a file reached twice through a
/// symlinked directory is kept once, while a symlinked file under its own
/// name is still a separate template with its own output.
pub fn dedupe_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::with_capacity(paths.len());

    paths
        .into_iter()
        .filter(|path| {
            let key = dedupe_key(path);
            let fresh = seen.insert(key);
            if !fresh {
                debug!("Skipping duplicate template {}", path.display());
            }
            fresh
        })
        .collect()
}

fn dedupe_key(path: &Path) -> PathBuf {
    path.parent()
        .and_then(|dir| fs::canonicalize(dir).ok())
        .zip(path.file_name())
        .map(|(dir, name)| dir.join(name))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pattern() -> Pattern {
        marker_pattern(".tmpl").unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    // ==================== marker_pattern tests ====================

    #[test]
    fn test_marker_pattern_matches_anywhere_in_name() {
        let p = pattern();
        assert!(p.matches("config.tmpl"));
        assert!(p.matches("app.tmpl.conf"));
        assert!(p.matches("x.tmplate"));
        assert!(!p.matches("config.yaml"));
        assert!(!p.matches("tmpl"));
    }

    #[test]
    fn test_marker_pattern_escapes_metacharacters() {
        let p = marker_pattern("[t]").unwrap();
        assert!(p.matches("a[t]b"));
        assert!(!p.matches("atb"));
    }

    // ==================== discover_templates tests ====================

    #[test]
    fn test_discover_root_and_nested() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("root.tmpl"), "").unwrap();
        fs::write(temp.path().join("a").join("one.tmpl.yaml"), "").unwrap();
        fs::write(nested.join("deep.tmpl.conf"), "").unwrap();
        fs::write(nested.join("plain.conf"), "").unwrap();

        let found = discover_templates(temp.path(), &pattern());

        assert_eq!(
            names(&found),
            vec!["deep.tmpl.conf", "one.tmpl.yaml", "root.tmpl"]
        );
    }

    #[test]
    fn test_discover_ignores_matching_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("dir.tmpl")).unwrap();

        let found = discover_templates(temp.path(), &pattern());
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_empty_root() {
        let temp = TempDir::new().unwrap();
        assert!(discover_templates(temp.path(), &pattern()).is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        assert!(discover_templates(&missing, &pattern()).is_empty());
    }

    #[test]
    fn test_discover_custom_marker() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.tpl.txt"), "").unwrap();
        fs::write(temp.path().join("b.tmpl.txt"), "").unwrap();

        let found = discover_templates(temp.path(), &marker_pattern(".tpl").unwrap());
        assert_eq!(names(&found), vec!["a.tpl.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_keeps_symlinked_file_under_own_name() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real.tmpl");
        fs::write(&real, "").unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("link.tmpl")).unwrap();

        let found = discover_templates(temp.path(), &pattern());
        assert_eq!(names(&found), vec!["link.tmpl", "real.tmpl"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_dedupes_symlinked_directory() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("realdir");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("a.tmpl"), "").unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("linkdir")).unwrap();

        let found = discover_templates(temp.path(), &pattern());
        assert_eq!(names(&found), vec!["a.tmpl"]);
    }

    // ==================== dedupe_paths tests ====================

    #[test]
    fn test_dedupe_paths_same_file_twice() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("x.tmpl");
        fs::write(&file, "").unwrap();
        let dotted = temp.path().join(".").join("x.tmpl");

        let deduped = dedupe_paths(vec![file.clone(), dotted, file.clone()]);

        assert_eq!(deduped, vec![file]);
    }

    #[test]
    fn test_dedupe_paths_keeps_distinct_missing_paths() {
        let deduped = dedupe_paths(vec![PathBuf::from("/nope/a"), PathBuf::from("/nope/b")]);
        assert_eq!(deduped.len(), 2);
    }
}
