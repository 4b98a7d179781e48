use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration — maps to `tome.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomeConfig {
    pub skills: SkillsConfig,
    pub selector: SelectorConfig,
    pub logging: LoggingConfig,
}

// ── Skills ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Skill directories in precedence order (first wins on duplicate names).
    /// Relative paths resolve against the directory holding `tome.toml`.
    pub dirs: Vec<PathBuf>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("skills")],
        }
    }
}

// ── Selector ───────────────────────────────────────────────────

/// How task text is scored against trigger descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Stemmed token overlap.
    #[default]
    Lexical,
    /// Cosine similarity of feature-hashed bag-of-words vectors.
    Hashed,
}

impl ScoringStrategy {
    pub const ALL: [&'static str; 2] = ["lexical", "hashed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Lexical => "lexical",
            ScoringStrategy::Hashed => "hashed",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(ScoringStrategy::Lexical),
            "hashed" => Ok(ScoringStrategy::Hashed),
            other => Err(format!(
                "unknown scoring strategy '{}' (expected one of: {})",
                other,
                Self::ALL.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Scoring strategy used by `match`.
    pub strategy: ScoringStrategy,
    /// Minimum score (0.0–1.0] for a bundle to be a candidate.
    pub threshold: f32,
    /// Maximum bundles activated by a single end-to-end selection.
    pub max_active: usize,
    /// Vector size for the hashed strategy.
    pub embedding_dims: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Lexical,
            threshold: 0.25,
            max_active: 2,
            embedding_dims: 256,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl TomeConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Skill directories ───
        if self.skills.dirs.is_empty() {
            warnings.push(ConfigWarning {
                field: "skills.dirs".into(),
                message: "no skill directories configured — nothing will be selected".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set e.g. dirs = [\"skills\"]".into()),
            });
        }
        for (i, dir) in self.skills.dirs.iter().enumerate() {
            if dir.as_os_str().is_empty() {
                warnings.push(ConfigWarning {
                    field: format!("skills.dirs[{}]", i),
                    message: "empty path".into(),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            }
        }

        // ── Threshold ───
        let t = self.selector.threshold;
        if !(t > 0.0 && t <= 1.0) {
            warnings.push(ConfigWarning {
                field: "selector.threshold".into(),
                message: format!("threshold {} is out of range", t),
                severity: WarningSeverity::Error,
                hint: Some("Threshold must be greater than 0.0 and at most 1.0".into()),
            });
        } else if t < 0.1 {
            warnings.push(ConfigWarning {
                field: "selector.threshold".into(),
                message: format!("threshold {} is very low — most bundles will match", t),
                severity: WarningSeverity::Info,
                hint: Some("Values between 0.2 and 0.5 work well for the lexical strategy".into()),
            });
        }

        // ── Max active ───
        if self.selector.max_active == 0 {
            warnings.push(ConfigWarning {
                field: "selector.max_active".into(),
                message: "max_active is 0 — selection will never activate a bundle".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 2".into()),
            });
        }

        // ── Embedding dims ───
        if self.selector.strategy == ScoringStrategy::Hashed && self.selector.embedding_dims < 16 {
            warnings.push(ConfigWarning {
                field: "selector.embedding_dims".into(),
                message: format!(
                    "{} dimensions is too small for the hashed strategy",
                    self.selector.embedding_dims
                ),
                severity: WarningSeverity::Error,
                hint: Some("Use at least 16; 256 is the default".into()),
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
