use std::path::{Path, PathBuf};

use repo_sync::{RuleFlags, SourceSpec, SubstitutionRule};
use serde::{Deserialize, Serialize};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".github/repo-file-sync.yaml";

/// Errors that can occur while loading the sync configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("environment variables file not found: {}", .0.display())]
    EnvsFileNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// On-disk shape of the YAML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub envs: Vec<EnvEntry>,
    /// Extra substitution rules, resolved relative to the config file.
    #[serde(default)]
    pub envs_file: Option<PathBuf>,
    pub sources: Vec<SourceEntry>,
}

/// A substitution rule: `name` is the pattern, `value` the replacement.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub regex: bool,
    /// Any of `i`, `m`, `s`.
    #[serde(default)]
    pub flags: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceEntry {
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub files: Vec<String>,
}

/// Validated configuration ready to hand to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub sources: Vec<SourceSpec>,
    pub rules: Vec<SubstitutionRule>,
}

impl SyncConfig {
    pub fn file_count(&self) -> usize {
        self.sources.iter().map(|s| s.files.len()).sum()
    }
}

/// Load, merge and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), "loading configuration");

    let config: Config = read_yaml(path)?;

    let mut envs = config.envs;
    if let Some(envs_file) = &config.envs_file {
        let base = path.parent().unwrap_or(Path::new("."));
        let envs_path = base.join(envs_file);
        if !envs_path.exists() {
            return Err(ConfigError::EnvsFileNotFound(envs_path));
        }
        let extra: Vec<EnvEntry> = read_yaml(&envs_path)?;
        tracing::debug!(path = %envs_path.display(), count = extra.len(), "loaded envs file");
        envs.extend(extra);
    }

    let rules = envs
        .iter()
        .enumerate()
        .map(|(i, env)| to_rule(i, env))
        .collect::<Result<Vec<_>, _>>()?;

    let sources = config
        .sources
        .into_iter()
        .enumerate()
        .map(|(i, source)| to_source(i, source))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        "loaded configuration with {} substitution rule(s) and {} source(s)",
        rules.len(),
        sources.len()
    );

    Ok(SyncConfig { sources, rules })
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml_ng::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn to_rule(index: usize, env: &EnvEntry) -> Result<SubstitutionRule, ConfigError> {
    if env.name.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "environment variable {index}: 'name' must not be empty"
        )));
    }

    let flags = match env.flags.as_deref() {
        Some(letters) => RuleFlags::parse(letters)
            .map_err(|e| ConfigError::Invalid(format!("environment variable {index}: {e}")))?,
        None => RuleFlags::default(),
    };

    let rule = if env.regex {
        SubstitutionRule::regex(&env.name, &env.value)
    } else {
        SubstitutionRule::literal(&env.name, &env.value)
    };
    Ok(rule.with_flags(flags))
}

fn to_source(index: usize, entry: SourceEntry) -> Result<SourceSpec, ConfigError> {
    let valid_repo = entry
        .repo
        .split_once('/')
        .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'));
    if !valid_repo {
        return Err(ConfigError::Invalid(format!(
            "source {index}: 'repo' must be in format 'owner/repo', got '{}'",
            entry.repo
        )));
    }

    if entry.reference.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "source {index}: 'ref' must not be empty"
        )));
    }

    Ok(SourceSpec::new(entry.repo, entry.reference, entry.files))
}
