use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".usort.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub rules: RuleConfig,
    pub imports: ImportsConfig,
    pub performance: PerformanceConfig,
    pub autofix: AutofixConfig,
    pub cache: CacheConfig,
    pub ignore: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RuleConfig {
    pub check_order: bool,
    pub check_duplicates: bool,
    pub check_placement: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            check_order: true,
            check_duplicates: true,
            check_placement: true,
        }
    }
}

/// Where sorted using directives should live relative to the namespace.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Hoist into the sole top-level namespace.
    Inside,
    /// Hoist namespace-scoped directives up to file scope.
    Outside,
    /// Sort within existing regions and scopes, moving nothing across
    /// boundaries.
    Preserve,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ImportsConfig {
    pub placement: Placement,
    /// When enabled, directives rooted at `standard_library_root` form
    /// their own group sorted before everything else.
    pub standard_first: bool,
    /// Insert one blank line between adjacent non-empty groups; when off,
    /// all groups merge into a single sorted run.
    pub separate_groups: bool,
    pub standard_library_root: String,
    /// Spaces per nesting level for rewritten directive lines. Indentation
    /// is configuration, never inferred from the file.
    pub indent_width: usize,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            placement: Placement::Preserve,
            standard_first: true,
            separate_groups: true,
            standard_library_root: "System".to_string(),
            indent_width: 4,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    pub parallel_analysis: bool,
    pub incremental_analysis: bool,
    pub memory_mapped_io: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_analysis: true,
            incremental_analysis: false,
            memory_mapped_io: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AutofixConfig {
    pub enabled: bool,
}

impl Default for AutofixConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn load_or_default(path: &Path) -> Self {
        let config_path = path.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Warning: ignoring malformed {}: {}", CONFIG_FILE_NAME, e),
                }
            }
        }
        Self::default()
    }
}

pub struct ConfigManager;

impl ConfigManager {
    pub fn new() -> Self {
        Self
    }

    pub fn create_default_config(&self) -> std::io::Result<()> {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).expect("default config serializes");
        std::fs::write(CONFIG_FILE_NAME, toml)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
