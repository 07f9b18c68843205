//! Application configuration for Lekcjonarz.
//!
//! User config lives at `~/.lekcjonarz/lekcjonarz.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LekcjonarzError, Result};
use crate::types::SpecialCase;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lekcjonarz.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lekcjonarz";

// ---------------------------------------------------------------------------
// Config structs (matching lekcjonarz.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source site layout.
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP header profile, timeout and throttling.
    #[serde(default)]
    pub http: HttpSection,

    /// Extraction phase settings.
    #[serde(default)]
    pub extract: ExtractSection,

    /// Thresholds of the citation heuristic.
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    /// Multi-page events that are kept whole and merged into one output.
    #[serde(default = "default_special_cases")]
    pub special_cases: Vec<SpecialCase>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            http: HttpSection::default(),
            extract: ExtractSection::default(),
            heuristics: HeuristicsConfig::default(),
            special_cases: default_special_cases(),
        }
    }
}

fn default_special_cases() -> Vec<SpecialCase> {
    vec![
        SpecialCase::new("Wigilia-Paschalna", "Wigilia Paschalna w Wielką Noc"),
        SpecialCase::new(
            "Wigilia-Zeslania-Ducha-Swietego",
            "Wigilia Zesłania Ducha Świętego",
        ),
        SpecialCase::new("Wniebowziecie", "Uroczystość Wniebowzięcia NMP"),
    ]
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site origin; relative links are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the navigator root page.
    #[serde(default = "default_navigator_path")]
    pub navigator_path: String,

    /// Folder label for documents linked directly from the root.
    #[serde(default = "default_root_folder")]
    pub root_folder: String,

    /// CSS classes of the containers whose anchors are followed.
    #[serde(default = "default_nav_containers")]
    pub nav_containers: Vec<String>,

    /// Substring marking an href as another navigator page.
    #[serde(default = "default_nav_link_pattern")]
    pub nav_link_pattern: String,

    /// Substring marking an href as a leaf document.
    #[serde(default = "default_doc_link_pattern")]
    pub doc_link_pattern: String,

    /// CSS class of the pager control on document pages.
    #[serde(default = "default_pager_class")]
    pub pager_class: String,

    /// Boilerplate prefixes stripped from sanitized folder labels.
    #[serde(default = "default_folder_prefixes")]
    pub folder_prefixes: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            navigator_path: default_navigator_path(),
            root_folder: default_root_folder(),
            nav_containers: default_nav_containers(),
            nav_link_pattern: default_nav_link_pattern(),
            doc_link_pattern: default_doc_link_pattern(),
            pager_class: default_pager_class(),
            folder_prefixes: default_folder_prefixes(),
        }
    }
}

fn default_base_url() -> String {
    "https://liturgia.wiara.pl".into()
}
fn default_navigator_path() -> String {
    "/Czytania_mszalne/Nawigator".into()
}
fn default_root_folder() -> String {
    "Okres_Glowny".into()
}
fn default_nav_containers() -> Vec<String> {
    vec![
        "menu_vert_open_w".into(),
        "dirstree".into(),
        "doc_content".into(),
    ]
}
fn default_nav_link_pattern() -> String {
    "/Czytania_mszalne/Nawigator/".into()
}
fn default_doc_link_pattern() -> String {
    "/doc/".into()
}
fn default_pager_class() -> String {
    "pgr".into()
}
fn default_folder_prefixes() -> Vec<String> {
    vec!["Nawigator_-_".into(), "Czytania_na_".into()]
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between requests to the same host (0 disables throttling).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: default_rate_limit(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36".into()
}
fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9".into()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_rate_limit() -> u64 {
    100
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractSection {
    /// Concurrent extraction units (single jobs or special-case groups).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Root of the per-section output tree.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Job Store written by `discover` and read by `extract`.
    #[serde(default = "default_jobs_file")]
    pub jobs_file: String,

    /// Error manifest written at the end of `extract`.
    #[serde(default = "default_errors_file")]
    pub errors_file: String,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            jobs_file: default_jobs_file(),
            errors_file: default_errors_file(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_output_dir() -> String {
    "Lekcjonarz_JSON".into()
}
fn default_jobs_file() -> String {
    "jobs.json".into()
}
fn default_errors_file() -> String {
    "errors.json".into()
}

/// `[heuristics]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Longest string still accepted as a citation.
    #[serde(default = "default_sigla_max_chars")]
    pub sigla_max_chars: usize,

    /// Most whitespace-separated tokens a citation may have.
    #[serde(default = "default_sigla_max_tokens")]
    pub sigla_max_tokens: usize,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            sigla_max_chars: default_sigla_max_chars(),
            sigla_max_tokens: default_sigla_max_tokens(),
        }
    }
}

fn default_sigla_max_chars() -> usize {
    150
}
fn default_sigla_max_tokens() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Runtime configs (derived from AppConfig + CLI flags)
// ---------------------------------------------------------------------------

/// Header profile and limits for every outgoing request.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub timeout: Duration,
    /// Minimum spacing between requests to one host; `None` disables it.
    pub min_interval: Option<Duration>,
}

impl From<&AppConfig> for HttpConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.http.user_agent.clone(),
            accept: config.http.accept.clone(),
            timeout: Duration::from_secs(config.http.timeout_secs),
            min_interval: (config.http.rate_limit_ms > 0)
                .then(|| Duration::from_millis(config.http.rate_limit_ms)),
        }
    }
}

/// Runtime discovery configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Site origin.
    pub base_url: Url,
    /// Navigator root page.
    pub navigator_url: Url,
    pub root_folder: String,
    pub nav_containers: Vec<String>,
    pub nav_link_pattern: String,
    pub doc_link_pattern: String,
    pub pager_class: String,
    pub folder_prefixes: Vec<String>,
    /// Concurrent base-page fetches while expanding pagination.
    pub concurrency: usize,
    pub special_cases: Vec<SpecialCase>,
}

impl TryFrom<&AppConfig> for CrawlConfig {
    type Error = LekcjonarzError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.site.base_url).map_err(|e| {
            LekcjonarzError::config(format!("invalid base_url '{}': {e}", config.site.base_url))
        })?;
        let navigator_url = base_url.join(&config.site.navigator_path).map_err(|e| {
            LekcjonarzError::config(format!(
                "invalid navigator_path '{}': {e}",
                config.site.navigator_path
            ))
        })?;

        Ok(Self {
            base_url,
            navigator_url,
            root_folder: config.site.root_folder.clone(),
            nav_containers: config.site.nav_containers.clone(),
            nav_link_pattern: config.site.nav_link_pattern.clone(),
            doc_link_pattern: config.site.doc_link_pattern.clone(),
            pager_class: config.site.pager_class.clone(),
            folder_prefixes: config.site.folder_prefixes.clone(),
            concurrency: config.extract.concurrency.max(1),
            special_cases: config.special_cases.clone(),
        })
    }
}

/// Runtime extraction configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub jobs_file: PathBuf,
    pub output_dir: PathBuf,
    pub errors_file: PathBuf,
    pub concurrency: usize,
    pub special_cases: Vec<SpecialCase>,
    pub sigla: SiglaRules,
}

impl From<&AppConfig> for ExtractConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            jobs_file: PathBuf::from(&config.extract.jobs_file),
            output_dir: PathBuf::from(&config.extract.output_dir),
            errors_file: PathBuf::from(&config.extract.errors_file),
            concurrency: config.extract.concurrency.max(1),
            special_cases: config.special_cases.clone(),
            sigla: SiglaRules::from(&config.heuristics),
        }
    }
}

/// Thresholds of the "looks like a biblical citation" heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiglaRules {
    pub max_chars: usize,
    pub max_tokens: usize,
}

impl Default for SiglaRules {
    fn default() -> Self {
        Self::from(&HeuristicsConfig::default())
    }
}

impl From<&HeuristicsConfig> for SiglaRules {
    fn from(config: &HeuristicsConfig) -> Self {
        Self {
            max_chars: config.sigla_max_chars,
            max_tokens: config.sigla_max_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lekcjonarz/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LekcjonarzError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lekcjonarz/lekcjonarz.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LekcjonarzError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LekcjonarzError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LekcjonarzError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = render_config(&AppConfig::default())?;

    std::fs::write(&path, content).map_err(|e| LekcjonarzError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Render a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| LekcjonarzError::config(e.to_string()))
}
