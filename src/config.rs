//! Interpreter settings: flags, then environment, then `bfi.toml`, then defaults.

use std::fs;
use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use directories::BaseDirs;

use crate::interpreter::StepControl;
use crate::tape::{PointerPolicy, DEFAULT_TAPE_LEN};

pub const CONFIG_FILE_NAME: &str = "bfi.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "BFI_CONFIG";
pub const MEMORY_ENV: &str = "BFI_MEMORY";
pub const STRICT_ENV: &str = "BFI_STRICT";
pub const MAX_STEPS_ENV: &str = "BFI_MAX_STEPS";
pub const TIMEOUT_ENV: &str = "BFI_TIMEOUT_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing filename parameter")]
    MissingProgram,

    #[error("cannot use a positional path together with --file")]
    ConflictingProgram,

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub memory: usize,
    pub policy: PointerPolicy,
    pub max_steps: Option<usize>,
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory: DEFAULT_TAPE_LEN,
            policy: PointerPolicy::Wrap,
            max_steps: None,
            timeout: None,
        }
    }
}

impl Settings {
    /// Resolve from the given flag values, the process environment and the config file.
    pub fn load(flags: &PartialSettings) -> Result<Self, ConfigError> {
        let env = PartialSettings::from_env(|key| std::env::var(key).ok())?;
        let file = load_file();
        Ok(Self::resolve(flags, &env, &file))
    }

    /// Layer the sources; earlier arguments win.
    pub fn resolve(flags: &PartialSettings, env: &PartialSettings, file: &PartialSettings) -> Self {
        let merged = flags.or(env).or(file);
        let defaults = Settings::default();
        Self {
            memory: merged.memory.unwrap_or(defaults.memory),
            policy: match merged.strict {
                Some(true) => PointerPolicy::Strict,
                _ => defaults.policy,
            },
            max_steps: merged.max_steps,
            timeout: merged.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn step_control(&self, cancel_flag: Arc<AtomicBool>) -> StepControl {
        StepControl::new(self.max_steps, cancel_flag).with_timeout(self.timeout)
    }
}

/// Settings from a single source; `None` means "not given here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSettings {
    pub memory: Option<usize>,
    pub strict: Option<bool>,
    pub max_steps: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl PartialSettings {
    fn or(&self, fallback: &PartialSettings) -> PartialSettings {
        PartialSettings {
            memory: self.memory.or(fallback.memory),
            strict: self.strict.or(fallback.strict),
            max_steps: self.max_steps.or(fallback.max_steps),
            timeout_ms: self.timeout_ms.or(fallback.timeout_ms),
        }
    }

    /// Read `BFI_*` variables through `lookup`. Malformed values are errors.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            memory: env_value(&lookup, MEMORY_ENV, parse_positive_u64)?.map(to_usize),
            strict: env_value(&lookup, STRICT_ENV, parse_bool)?,
            max_steps: env_value(&lookup, MAX_STEPS_ENV, parse_positive_u64)?.map(to_usize),
            timeout_ms: env_value(&lookup, TIMEOUT_ENV, parse_positive_u64)?,
        })
    }

    /// Parse the `[interpreter]` section of a config file.
    ///
    /// Unknown keys and bad values are skipped with a warning.
    pub fn from_toml(content: &str) -> Self {
        let mut in_section = false;
        let mut out = PartialSettings::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                in_section = line[1..line.len() - 1].trim() == "interpreter";
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line, "ignoring malformed config line");
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            let applied = match key {
                "memory" => parse_positive_u64(value).map(|v| out.memory = Some(to_usize(v))),
                "strict" => parse_bool(value).map(|v| out.strict = Some(v)),
                "max_steps" => parse_positive_u64(value).map(|v| out.max_steps = Some(to_usize(v))),
                "timeout_ms" => parse_positive_u64(value).map(|v| out.timeout_ms = Some(v)),
                _ => Err("unknown key".to_string()),
            };
            if let Err(reason) = applied {
                tracing::warn!(key, value, %reason, "ignoring config entry");
            }
        }
        out
    }
}

/// Look up and parse one variable; unset or blank means "not given".
fn env_value<F, P, T>(lookup: &F, key: &str, parse: P) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(&raw).map(Some).map_err(|reason| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason,
        }),
    }
}

/// Location of the config file: `$BFI_CONFIG`, else `bfi.toml` in the user config dir.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    // Linux: ~/.config, macOS: ~/Library/Application Support, Windows: %APPDATA%
    let base_dirs = BaseDirs::new()?;
    Some(base_dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Settings from the config file; empty when there is none.
pub fn load_file() -> PartialSettings {
    let Some(path) = config_path() else {
        return PartialSettings::default();
    };
    match fs::read_to_string(&path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "read config file");
            PartialSettings::from_toml(&content)
        }
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "no config file");
            PartialSettings::default()
        }
    }
}

/// Positive integer, as accepted by `--memory` and `--max-steps`.
pub fn parse_positive(s: &str) -> Result<usize, String> {
    parse_positive_u64(s).map(to_usize)
}

/// Positive integer, as accepted by `--timeout`.
pub fn parse_positive_u64(s: &str) -> Result<u64, String> {
    match parse_u64(s)? {
        0 => Err("must be at least 1".to_string()),
        n => Ok(n),
    }
}

fn parse_u64(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| format!("expected a non-negative integer: {e}"))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

fn to_usize(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}
