//! Client configuration: defaults, `config.toml`, environment, CLI flags.
//!
//! Priority (highest first): CLI flags, environment (`LIBRARY_API_URL`,
//! `LIBRARY_TOKEN_PATH`), `config.toml`, built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::session::{default_token_path, resolve_config_dir, sanitize_env_path};

/// Default service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default whole-request timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the service base URL.
pub const API_URL_ENV: &str = "LIBRARY_API_URL";
/// Environment variable overriding the token file location.
pub const TOKEN_PATH_ENV: &str = "LIBRARY_TOKEN_PATH";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Values read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Service base URL.
    pub api_url: Option<String>,
    /// Token file location.
    pub token_path: Option<PathBuf>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(api_url) = self.api_url.as_deref()
            && api_url.trim().is_empty()
        {
            bail!("Invalid config value for `api_url`: must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Source-independent overrides (environment or CLI flags).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Service base URL.
    pub api_url: Option<String>,
    /// Token file location.
    pub token_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Reads overrides from the process environment, ignoring blank values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: env::var(API_URL_ENV)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            token_path: sanitize_env_path(env::var_os(TOKEN_PATH_ENV)),
        }
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL.
    pub api_url: String,
    /// Token file location.
    pub token_path: PathBuf,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl ClientConfig {
    /// Merges the sources in priority order.
    ///
    /// # Errors
    ///
    /// Returns an error when no token path is configured and no default
    /// config directory can be determined.
    pub fn resolve(
        file: Option<&FileConfig>,
        env: &ConfigOverrides,
        cli: &ConfigOverrides,
    ) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();

        let api_url = cli
            .api_url
            .clone()
            .or_else(|| env.api_url.clone())
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token_path = match cli
            .token_path
            .clone()
            .or_else(|| env.token_path.clone())
            .or(file.token_path)
        {
            Some(path) => path,
            None => default_token_path().context("Failed to resolve default token path")?,
        };

        Ok(Self {
            api_url,
            token_path,
            connect_timeout_secs: file
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout_secs: file.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
        })
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/library-client/config.toml`
/// 2. `$HOME/.config/library-client/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        None,
    )
    .ok()
    .map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads config from `path`, or the default path when `None`. A missing file is not an error.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_file_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let path = path.map(Path::to_path_buf).or_else(resolve_default_config_path);
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };
    if !path_ref.exists() {
        return Ok(LoadedConfig { path, config: None });
    }

    let raw = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path_ref.display()))?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

/// Parses `key = value` lines. `#` starts a comment outside quotes.
///
/// # Errors
///
/// Returns a line-numbered error for bad syntax, unknown keys, or
/// out-of-range values.
pub fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "api_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `api_url` value on line {line_no}"))?;
                cfg.api_url = Some(parsed);
            }
            "token_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `token_path` value on line {line_no}"))?;
                cfg.token_path = Some(PathBuf::from(parsed));
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            # service settings
            api_url = "https://library.example.edu/api"  # trailing comment
            token_path = "/tmp/library/token"
            connect_timeout_secs = 5
            read_timeout_secs = 60
        "#;
        let cfg = parse_config_str(raw).unwrap();
        assert_eq!(cfg.api_url.as_deref(), Some("https://library.example.edu/api"));
        assert_eq!(cfg.token_path, Some(PathBuf::from("/tmp/library/token")));
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(60));
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        let cfg = parse_config_str(r#"api_url = "http://host/#frag""#).unwrap();
        assert_eq!(cfg.api_url.as_deref(), Some("http://host/#frag"));
    }

    #[test]
    fn test_unknown_key_is_rejected_with_line_number() {
        let err = parse_config_str("\nconcurrency = 4").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("concurrency"), "unexpected: {msg}");
        assert!(msg.contains("line 2"), "unexpected: {msg}");
    }

    #[test]
    fn test_missing_equals_is_rejected() {
        let err = parse_config_str("api_url").unwrap_err();
        assert!(err.to_string().contains("expected key = value"));
    }

    #[test]
    fn test_unquoted_string_is_rejected() {
        assert!(parse_config_str("api_url = http://x").is_err());
    }

    #[test]
    fn test_timeout_out_of_range_is_rejected() {
        let err = parse_config_str("read_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("read_timeout_secs"));
        assert!(parse_config_str("connect_timeout_secs = 3601").is_err());
        assert!(parse_config_str("connect_timeout_secs = -1").is_err());
    }

    #[test]
    fn test_resolve_priority_cli_over_env_over_file() {
        let file = FileConfig {
            api_url: Some("http://file".to_string()),
            token_path: Some(PathBuf::from("/file/token")),
            connect_timeout_secs: Some(3),
            read_timeout_secs: None,
        };
        let env = ConfigOverrides {
            api_url: Some("http://env".to_string()),
            token_path: None,
        };
        let cli = ConfigOverrides {
            api_url: None,
            token_path: Some(PathBuf::from("/cli/token")),
        };

        let resolved = ClientConfig::resolve(Some(&file), &env, &cli).unwrap();
        assert_eq!(resolved.api_url, "http://env");
        assert_eq!(resolved.token_path, PathBuf::from("/cli/token"));
        assert_eq!(resolved.connect_timeout_secs, 3);
        assert_eq!(resolved.read_timeout_secs, DEFAULT_READ_TIMEOUT_SECS);
    }

    #[test]
    fn test_resolve_defaults_api_url() {
        let cli = ConfigOverrides {
            api_url: None,
            token_path: Some(PathBuf::from("/t")),
        };
        let resolved = ClientConfig::resolve(None, &ConfigOverrides::default(), &cli).unwrap();
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_file_config_missing_file_is_none() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("config.toml");
        let loaded = load_file_config(Some(&path)).unwrap();
        assert!(loaded.config.is_none());
        assert_eq!(loaded.path, Some(path));
    }

    #[test]
    fn test_load_file_config_reads_explicit_path() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("config.toml");
        fs::write(&path, "api_url = \"http://127.0.0.1:8080\"\n").unwrap();

        let loaded = load_file_config(Some(&path)).unwrap();
        assert_eq!(
            loaded.config.unwrap().api_url.as_deref(),
            Some("http://127.0.0.1:8080")
        );
    }

    #[test]
    fn test_load_file_config_reports_path_on_parse_error() {
        let tempdir = TempDir::new().unwrap();
        let path = tempdir.path().join("config.toml");
        fs::write(&path, "bogus = 1\n").unwrap();

        let err = load_file_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }
}
