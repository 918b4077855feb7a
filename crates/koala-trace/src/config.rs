//! Project configuration loaded from `koala.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smol_str::SmolStr;
use tracing::warn;

use crate::error::ConfigError;

pub(crate) const CONFIG_FILES: &[&str] = &["koala.toml", ".koala.toml"];

/// Hit count at which a location is considered hot.
pub const HOT_HIT_THRESHOLD: usize = 3;
/// Lines above and below a hit scanned by the near-hit detector.
pub const NEIGHBOR_RADIUS: u32 = 3;
/// Maximum excerpt length, in characters.
pub const EXCERPT_WIDTH: usize = 80;
/// Minimum function span, in lines, for the complexity detector.
pub const MIN_FUNCTION_LINES: u32 = 10;
/// Minimum number of distinct control keyword kinds for the complexity detector.
pub const MIN_CONTROL_KEYWORDS: u32 = 2;
/// Substrings that mark a line as a print/log statement.
pub const DEFAULT_LOG_PATTERNS: &[&str] = &["println(", "System.out.print", "log(", "logger."];
/// File extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["kt", "java"];

/// Project configuration loaded from `koala.toml`.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Root directory of the scanned source tree.
    pub root: PathBuf,
    /// Config file path (if found).
    pub config_path: Option<PathBuf>,
    /// Source enumeration settings.
    pub sources: SourceSettings,
    /// Detector thresholds.
    pub heuristics: HeuristicSettings,
}

impl ProjectConfig {
    /// Load the first config file found under `root`, falling back to defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = find_config_file(root);
        let Some(path) = config_path.clone() else {
            return ProjectConfig::base(root, None);
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            warn!("Failed to read koala config at {}", path.display());
            return ProjectConfig::base(root, config_path);
        };
        ProjectConfig::from_contents(root, config_path, &contents)
    }

    /// Load an explicit config file; unlike [`ProjectConfig::load`] failures are errors.
    pub fn load_file(root: &Path, path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = ProjectConfig::base(root, Some(path.to_path_buf()));
        config.apply(parsed);
        Ok(config)
    }

    pub fn from_contents(root: &Path, config_path: Option<PathBuf>, contents: &str) -> Self {
        let mut config = ProjectConfig::base(root, config_path);
        let parsed: ConfigFile = match toml::from_str(contents) {
            Ok(parsed) => parsed,
            Err(err) => {
                if let Some(path) = &config.config_path {
                    warn!("Failed to parse koala config at {}: {err}", path.display());
                } else {
                    warn!("Failed to parse koala config: {err}");
                }
                return config;
            }
        };
        config.apply(parsed);
        config
    }

    fn base(root: &Path, config_path: Option<PathBuf>) -> Self {
        ProjectConfig {
            root: root.to_path_buf(),
            config_path,
            sources: SourceSettings::default(),
            heuristics: HeuristicSettings::default(),
        }
    }

    fn apply(&mut self, parsed: ConfigFile) {
        self.sources = parsed.sources.into();
        self.heuristics = parsed.heuristics.into();
    }
}

/// Which files the source tree enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Recognised file extensions, without the dot.
    pub extensions: Vec<SmolStr>,
    /// Include globs relative to the root; empty means every recognised file.
    pub include: Vec<String>,
    /// Exclude globs relative to the root; directories exclude everything below.
    pub exclude: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().copied().map(SmolStr::new).collect(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl From<SourcesSection> for SourceSettings {
    fn from(section: SourcesSection) -> Self {
        let defaults = SourceSettings::default();
        let extensions = section
            .extensions
            .map(|list| {
                list.iter()
                    .map(|ext| ext.trim().trim_start_matches('.'))
                    .filter(|ext| !ext.is_empty())
                    .map(SmolStr::new)
                    .collect()
            })
            .unwrap_or(defaults.extensions);
        Self {
            extensions,
            include: normalize_globs(&section.include),
            exclude: normalize_globs(&section.exclude),
        }
    }
}

/// Thresholds shared by the view builder and the heuristic engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicSettings {
    pub hot_threshold: usize,
    pub neighbor_radius: u32,
    pub excerpt_width: usize,
    pub min_function_lines: u32,
    pub min_control_keywords: u32,
    /// Substrings that mark a print/log statement, matched against trimmed lines.
    pub log_patterns: Vec<String>,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            hot_threshold: HOT_HIT_THRESHOLD,
            neighbor_radius: NEIGHBOR_RADIUS,
            excerpt_width: EXCERPT_WIDTH,
            min_function_lines: MIN_FUNCTION_LINES,
            min_control_keywords: MIN_CONTROL_KEYWORDS,
            log_patterns: DEFAULT_LOG_PATTERNS.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl From<HeuristicsSection> for HeuristicSettings {
    fn from(section: HeuristicsSection) -> Self {
        let defaults = HeuristicSettings::default();
        let log_patterns = section
            .log_patterns
            .map(|patterns| {
                patterns
                    .into_iter()
                    .filter(|pattern| !pattern.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.log_patterns);
        Self {
            hot_threshold: section.hot_threshold.unwrap_or(defaults.hot_threshold).max(1),
            neighbor_radius: section.neighbor_radius.unwrap_or(defaults.neighbor_radius),
            excerpt_width: section.excerpt_width.unwrap_or(defaults.excerpt_width),
            min_function_lines: section
                .min_function_lines
                .unwrap_or(defaults.min_function_lines),
            min_control_keywords: section
                .min_control_keywords
                .unwrap_or(defaults.min_control_keywords),
            log_patterns,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sources: SourcesSection,
    #[serde(default)]
    heuristics: HeuristicsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SourcesSection {
    extensions: Option<Vec<String>>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HeuristicsSection {
    hot_threshold: Option<usize>,
    neighbor_radius: Option<u32>,
    excerpt_width: Option<usize>,
    min_function_lines: Option<u32>,
    min_control_keywords: Option<u32>,
    log_patterns: Option<Vec<String>>,
}

pub(crate) fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

fn normalize_globs(globs: &[String]) -> Vec<String> {
    globs
        .iter()
        .map(|glob| glob.trim())
        .filter(|glob| !glob.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn temp_dir(label: &str) -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "koala-config-{label}-{}-{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_uses_defaults() {
        let root = temp_dir("missing");
        let config = ProjectConfig::load(&root);
        assert!(config.config_path.is_none());
        assert_eq!(config.heuristics, HeuristicSettings::default());
        assert_eq!(config.sources.extensions, vec!["kt", "java"]);
    }

    #[test]
    fn sections_override_individual_fields() {
        let root = temp_dir("override");
        fs::write(
            root.join(".koala.toml"),
            r#"
[sources]
extensions = [".kt", "kts", " "]
exclude = ["build/**", "  "]

[heuristics]
hot_threshold = 5
log_patterns = ["Log.d(", ""]
"#,
        )
        .expect("write config");

        let config = ProjectConfig::load(&root);
        assert_eq!(config.config_path, Some(root.join(".koala.toml")));
        assert_eq!(config.sources.extensions, vec!["kt", "kts"]);
        assert_eq!(config.sources.exclude, vec!["build/**"]);
        assert_eq!(config.heuristics.hot_threshold, 5);
        assert_eq!(config.heuristics.neighbor_radius, NEIGHBOR_RADIUS);
        assert_eq!(config.heuristics.log_patterns, vec!["Log.d("]);
    }

    #[test]
    fn koala_toml_wins_over_dotfile() {
        let root = temp_dir("order");
        fs::write(root.join("koala.toml"), "[heuristics]\nexcerpt_width = 40\n").expect("write");
        fs::write(root.join(".koala.toml"), "[heuristics]\nexcerpt_width = 20\n").expect("write");
        assert_eq!(ProjectConfig::load(&root).heuristics.excerpt_width, 40);
    }

    #[test]
    fn malformed_contents_fall_back_to_defaults() {
        let root = temp_dir("malformed");
        let config = ProjectConfig::from_contents(&root, None, "[heuristics\nhot_threshold = ");
        assert_eq!(config.heuristics, HeuristicSettings::default());
    }

    #[test]
    fn explicit_file_reports_errors() {
        let root = temp_dir("explicit");
        let missing = root.join("nope.toml");
        assert!(matches!(
            ProjectConfig::load_file(&root, &missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = root.join("bad.toml");
        fs::write(&bad, "[heuristics]\nhot_threshold = \"many\"\n").expect("write");
        let err = ProjectConfig::load_file(&root, &bad).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn zero_hot_threshold_is_clamped() {
        let config = ProjectConfig::from_contents(
            Path::new("."),
            None,
            "[heuristics]\nhot_threshold = 0\n",
        );
        assert_eq!(config.heuristics.hot_threshold, 1);
    }
}
