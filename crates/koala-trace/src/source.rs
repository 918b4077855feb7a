//! Source tree enumeration and line excerpts.

use std::io;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::config::SourceSettings;
use crate::error::SourceError;

/// Placeholder shown when a line cannot be read.
pub const UNAVAILABLE_EXCERPT: &str = "[unavailable]";

/// Read access to the files the heuristic engine scans.
pub trait SourceTree: Send + Sync {
    /// Every recognised source file, in a stable order.
    fn files(&self) -> Result<Vec<PathBuf>, SourceError>;

    /// Full text of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Canonical form used to compare locations across collaborators.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    /// Canonical form, or `path` unchanged when it cannot be resolved.
    fn canonicalize_lossy(&self, path: &Path) -> PathBuf {
        self.canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Source tree backed by the filesystem under one root.
#[derive(Debug, Clone)]
pub struct FsSourceTree {
    root: PathBuf,
    settings: SourceSettings,
}

impl FsSourceTree {
    pub fn new(root: impl Into<PathBuf>, settings: SourceSettings) -> Self {
        let root = root.into();
        Self {
            root: std::fs::canonicalize(&root).unwrap_or(root),
            settings,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn include_patterns(&self) -> Vec<String> {
        if self.settings.include.is_empty() {
            let extensions: Vec<&str> = self
                .settings
                .extensions
                .iter()
                .map(smol_str::SmolStr::as_str)
                .collect();
            vec![format!("**/*.{{{}}}", extensions.join(","))]
        } else {
            self.settings.include.clone()
        }
    }

    fn is_recognised(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.settings
            .extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    fn is_hidden(&self, path: &Path) -> bool {
        path.strip_prefix(&self.root).is_ok_and(|relative| {
            relative
                .components()
                .any(|part| part.as_os_str().to_string_lossy().starts_with('.'))
        })
    }

    /// Every path under the root matching one of `patterns`.
    fn matching(&self, patterns: &[String]) -> Result<Vec<PathBuf>, SourceError> {
        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };
        let mut matches = Vec::new();
        for pattern in patterns.iter().flat_map(|pattern| expand_braces(pattern)) {
            let anchored = self.root.join(&pattern).to_string_lossy().replace('\\', "/");
            let entries = glob_with(&anchored, options)
                .map_err(|source| SourceError::InvalidGlob { pattern, source })?;
            for entry in entries {
                match entry {
                    Ok(path) => matches.push(self.canonicalize_lossy(&path)),
                    Err(err) => warn!("skipping unreadable path during enumeration: {err}"),
                }
            }
        }
        Ok(matches)
    }
}

impl SourceTree for FsSourceTree {
    fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let excluded = self.matching(&self.settings.exclude)?;
        let mut unique = FxHashSet::default();
        let mut files: Vec<PathBuf> = self
            .matching(&self.include_patterns())?
            .into_iter()
            .filter(|path| unique.insert(path.clone()))
            .filter(|path| path.is_file() && self.is_recognised(path) && !self.is_hidden(path))
            .filter(|path| !excluded.iter().any(|skip| path.starts_with(skip)))
            .collect();
        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "enumerated source tree");
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Source tree held in memory; paths are already canonical.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceTree {
    files: IndexMap<PathBuf, String>,
}

impl MemorySourceTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl SourceTree for MemorySourceTree {
    fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the tree", path.display()),
            )
        })
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// Trimmed `line`, cut to at most `width` characters.
#[must_use]
pub fn excerpt(line: &str, width: usize) -> String {
    line.trim().chars().take(width).collect()
}

/// Excerpt of zero-based `line` in `text`, if the line exists.
#[must_use]
pub fn line_excerpt(text: &str, line: u32, width: usize) -> Option<String> {
    let index = usize::try_from(line).ok()?;
    text.lines().nth(index).map(|content| excerpt(content, width))
}

/// Expand `{a,b}` alternatives, which `glob` does not support. Groups may nest.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let mut depth = 0usize;
    let mut options = Vec::new();
    let mut option_start = open + 1;
    for (idx, ch) in pattern[open..].char_indices().map(|(i, c)| (i + open, c)) {
        match ch {
            '{' => depth += 1,
            ',' if depth == 1 => {
                options.push(&pattern[option_start..idx]);
                option_start = idx + 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    options.push(&pattern[option_start..idx]);
                    let (prefix, suffix) = (&pattern[..open], &pattern[idx + 1..]);
                    return options
                        .into_iter()
                        .flat_map(|option| expand_braces(&format!("{prefix}{option}{suffix}")))
                        .collect();
                }
            }
            _ => {}
        }
    }
    vec![pattern.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn temp_root(label: &str) -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "koala-source-{label}-{}-{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, "fun main() {}\n").expect("write file");
    }

    fn relative(tree: &FsSourceTree) -> Vec<String> {
        tree.files()
            .expect("enumerate")
            .iter()
            .map(|path| {
                path.strip_prefix(tree.root())
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn expands_brace_globs() {
        let patterns = expand_braces("**/*.{kt,java}");
        assert_eq!(patterns, vec!["**/*.kt", "**/*.java"]);
    }

    #[test]
    fn unbalanced_braces_are_kept_literally() {
        assert_eq!(expand_braces("src/{a,b"), vec!["src/{a,b"]);
        assert_eq!(expand_braces("{x,{y,z}}.kt"), vec!["x.kt", "y.kt", "z.kt"]);
    }

    #[test]
    fn expands_nested_braces() {
        let mut patterns = expand_braces("a{b,c}d{e,f}");
        patterns.sort();
        assert_eq!(patterns, vec!["abde", "abdf", "acde", "acdf"]);
    }

    #[test]
    fn default_walk_filters_extensions_and_hidden_dirs() {
        let root = temp_root("default");
        touch(&root, "src/Main.kt");
        touch(&root, "src/util/Helper.java");
        touch(&root, "README.md");
        touch(&root, ".gradle/Cached.kt");

        let tree = FsSourceTree::new(&root, SourceSettings::default());
        assert_eq!(relative(&tree), vec!["src/Main.kt", "src/util/Helper.java"]);
    }

    #[test]
    fn include_and_exclude_globs_apply() {
        let root = temp_root("globs");
        touch(&root, "app/Main.kt");
        touch(&root, "app/generated/Gen.kt");
        touch(&root, "lib/Lib.kt");
        touch(&root, "app/notes.txt");

        let settings = SourceSettings {
            extensions: vec![SmolStr::new("kt")],
            include: vec!["app/**/*".to_string()],
            exclude: vec!["app/{generated,tmp}".to_string()],
        };
        let tree = FsSourceTree::new(&root, settings);
        assert_eq!(relative(&tree), vec!["app/Main.kt"]);
    }

    #[test]
    fn invalid_globs_are_errors() {
        let root = temp_root("invalid");
        let settings = SourceSettings {
            include: vec!["src/[".to_string()],
            ..SourceSettings::default()
        };
        let tree = FsSourceTree::new(&root, settings);
        assert!(matches!(tree.files(), Err(SourceError::InvalidGlob { .. })));
    }

    #[test]
    fn excerpts_trim_and_truncate() {
        assert_eq!(excerpt("    val x = 1   ", 80), "val x = 1");
        assert_eq!(excerpt("abcdef", 3), "abc");
        assert_eq!(line_excerpt("a\n  b\n", 1, 80).as_deref(), Some("b"));
        assert_eq!(line_excerpt("a\n", 4, 80), None);
    }

    #[test]
    fn memory_tree_reports_missing_files() {
        let tree = MemorySourceTree::new().with_file("/x/A.kt", "text");
        assert_eq!(tree.read(Path::new("/x/A.kt")).expect("read"), "text");
        assert_eq!(
            tree.read(Path::new("/x/B.kt")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
