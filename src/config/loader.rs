//! Configuration loading from disk and the process environment.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML file (if any),
//! environment variables. The merged result is validated once and never
//! changes afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A recoverable oddity found while loading. Reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("migration percent {value} is outside 0..=100, clamping to {clamped}")]
    PercentClamped { value: i64, clamped: u8 },

    #[error("{var}={value:?} is not a number, treating it as 0")]
    PercentNotNumeric { var: &'static str, value: String },

    #[error("{var}={value:?} is not a valid {expected}, ignoring it")]
    Ignored {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Configuration ready for use, plus anything worth logging about it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GatewayConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Load configuration from an optional TOML file and the real environment.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => GatewayConfig::default(),
    };

    let mut warnings = apply_env_overrides(&mut config, env);

    let clamped = config.migration.clamped_percent();
    if i64::from(clamped) != config.migration.percent {
        warnings.push(ConfigWarning::PercentClamped {
            value: config.migration.percent,
            clamped,
        });
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(LoadedConfig { config, warnings })
}

fn read_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay environment variables onto `config`.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F) -> Vec<ConfigWarning>
where
    F: Fn(&str) -> Option<String>,
{
    // An empty variable counts as unset, as with an unset `${VAR}` in compose files.
    let env = |key: &str| env(key).filter(|value| !value.is_empty());
    let mut warnings = Vec::new();

    if let Some(host) = env("GATEWAY_HOST") {
        config.listener.host = host;
    }
    if let Some(raw) = env("PORT") {
        match raw.trim().parse() {
            Ok(port) => config.listener.port = port,
            Err(_) => warnings.push(ConfigWarning::Ignored {
                var: "PORT",
                value: raw,
                expected: "port number",
            }),
        }
    }

    if let Some(url) = env("MONOLITH_URL") {
        config.upstreams.monolith_url = url;
    }
    if let Some(url) = env("MOVIES_SERVICE_URL") {
        config.upstreams.movies_url = url;
    }
    if let Some(url) = env("EVENTS_SERVICE_URL") {
        config.upstreams.events_url = url;
    }

    if let Some(raw) = env("GRADUAL_MIGRATION") {
        config.migration.gradual = parse_flag(&raw);
    }
    if let Some(raw) = env("MOVIES_MIGRATION_PERCENT") {
        match parse_percent(&raw) {
            Some(percent) => config.migration.percent = percent,
            None => {
                config.migration.percent = 0;
                warnings.push(ConfigWarning::PercentNotNumeric {
                    var: "MOVIES_MIGRATION_PERCENT",
                    value: raw,
                });
            }
        }
    }

    for (var, slot) in [
        ("UPSTREAM_CONNECT_TIMEOUT_SECS", &mut config.timeouts.connect_secs),
        ("UPSTREAM_TIMEOUT_SECS", &mut config.timeouts.request_secs),
    ] {
        if let Some(raw) = env(var) {
            match raw.trim().parse() {
                Ok(secs) => *slot = secs,
                Err(_) => warnings.push(ConfigWarning::Ignored {
                    var,
                    value: raw,
                    expected: "number of seconds",
                }),
            }
        }
    }

    if let Some(raw) = env("LOG_FORMAT") {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => config.observability.log_format = LogFormat::Json,
            "pretty" => config.observability.log_format = LogFormat::Pretty,
            _ => warnings.push(ConfigWarning::Ignored {
                var: "LOG_FORMAT",
                value: raw,
                expected: "log format (pretty|json)",
            }),
        }
    }

    warnings
}

/// Only the literal `true` (any case) enables a flag.
fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Parse a percentage the way a JavaScript `Number()` conversion would:
/// decimal and exponent notation, `0x`/`0o`/`0b` integers and `Infinity`.
/// Fractions are rounded. Range clamping happens later so it can be reported.
fn parse_percent(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let value = match raw {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => parse_prefixed_integer(raw).or_else(|| parse_decimal(raw))?,
    };
    // `as` saturates, so infinities land on i64::MIN / i64::MAX.
    Some(value.round() as i64)
}

fn parse_prefixed_integer(raw: &str) -> Option<f64> {
    let radix = match raw.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|v| v as f64)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    // Rust also accepts "inf" and "nan", which are not numbers here.
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    raw.parse().ok()
}
