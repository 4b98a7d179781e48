use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::{ScoringStrategy, TomeConfig};

/// Loads the Tome configuration and resolves paths relative to it.
pub struct ConfigLoader {
    config: TomeConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > TOME_CONFIG env > ~/.tome/tome.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        Self::resolve_path_with_env(explicit, &|key| std::env::var(key).ok())
    }

    fn resolve_path_with_env<F>(explicit: Option<&Path>, env: &F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Some(p) = env("TOME_CONFIG").filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        Self::default_path()
    }

    /// `~/.tome/tome.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tome")
            .join("tome.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> tome_core::Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`ConfigLoader::load`], with an explicit environment lookup. Every
    /// variable, `TOME_CONFIG` included, is read through `env`.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> tome_core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = Self::resolve_path_with_env(path, &env);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw, &config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            TomeConfig::default()
        };

        let config = Self::apply_env_overrides(config, env)?;

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(tome_core::TomeError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    fn parse(raw: &str, path: &Path) -> tome_core::Result<TomeConfig> {
        toml::from_str::<TomeConfig>(raw).map_err(|e| {
            tome_core::TomeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// The loaded configuration.
    pub fn get(&self) -> &TomeConfig {
        &self.config
    }

    /// Consume the loader, keeping only the configuration.
    pub fn into_config(self) -> TomeConfig {
        self.config
    }

    /// Path the config was resolved from (it may not exist).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Skill directories with `~` expanded and relative entries resolved
    /// against the config file's directory, in precedence order.
    pub fn skill_dirs(&self) -> Vec<PathBuf> {
        let base = self.config_path.parent().unwrap_or(Path::new("."));
        self.config
            .skills
            .dirs
            .iter()
            .map(|d| resolve_dir(d, base))
            .collect()
    }

    /// Apply env var overrides (TOME_SKILLS_DIRS, TOME_SELECTOR_STRATEGY, etc.)
    fn apply_env_overrides<F>(mut config: TomeConfig, env: F) -> tome_core::Result<TomeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env("TOME_SKILLS_DIRS") {
            let dirs: Vec<PathBuf> = std::env::split_paths(&v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !dirs.is_empty() {
                config.skills.dirs = dirs;
            }
        }
        if let Some(v) = env("TOME_SELECTOR_STRATEGY") {
            config.selector.strategy = v.parse::<ScoringStrategy>().map_err(|e| {
                tome_core::TomeError::ConfigValidation {
                    field: "TOME_SELECTOR_STRATEGY".into(),
                    reason: e,
                }
            })?;
        }
        if let Some(v) = env("TOME_SELECTOR_THRESHOLD") {
            match v.parse::<f32>() {
                Ok(t) => config.selector.threshold = t,
                Err(_) => warn!(value = %v, "ignoring unparseable TOME_SELECTOR_THRESHOLD"),
            }
        }
        if let Some(v) = env("TOME_LOG_LEVEL") {
            config.logging.level = v;
        }
        Ok(config)
    }
}

fn resolve_dir(dir: &Path, base: &Path) -> PathBuf {
    if let Ok(rest) = dir.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}
