//! Alignment configuration (`realign.toml`).
//!
//! Defines the typed policy for a pass: how module versions are rewritten,
//! which override source wins, how strict alignment behaves, explicit
//! overrides, removals, and the stage order.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::versioning::{Suffix, VersionPolicy};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Parsed from `realign.toml`. Missing fields use defaults.
/// Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealignConfig {
    /// Module version rewriting.
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Dependency alignment.
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Plugin and profile removal.
    #[serde(default)]
    pub removal: RemovalConfig,

    /// Stage ordering.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

// ---------------------------------------------------------------------------
// VersioningConfig
// ---------------------------------------------------------------------------

/// How module versions are rewritten.
///
/// Versioning is enabled when any of `override`, `suffix` or
/// `incremental_suffix` is set. A static `suffix` takes precedence over
/// `incremental_suffix`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersioningConfig {
    /// Replace every module version with this literal before suffixing.
    #[serde(default, rename = "override")]
    pub override_version: Option<String>,

    /// Static qualifier suffix, e.g. `"redhat-1"`.
    #[serde(default)]
    pub suffix: Option<String>,

    /// Incremental qualifier suffix, e.g. `"redhat"`. The build number is
    /// computed from the available candidate versions.
    #[serde(default)]
    pub incremental_suffix: Option<String>,

    /// Keep `-SNAPSHOT` on rewritten versions.
    #[serde(default)]
    pub preserve_snapshot: bool,

    /// Render OSGi-compatible versions (default: `true`).
    #[serde(default = "default_true")]
    pub osgi: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            override_version: None,
            suffix: None,
            incremental_suffix: None,
            preserve_snapshot: false,
            osgi: default_true(),
        }
    }
}

impl VersioningConfig {
    /// The policy to apply, or `None` when versioning is disabled.
    #[must_use]
    pub fn policy(&self) -> Option<VersionPolicy> {
        let suffix = match (
            non_empty(self.suffix.as_deref()),
            non_empty(self.incremental_suffix.as_deref()),
        ) {
            (Some(s), _) => Suffix::Static(s.to_owned()),
            (None, Some(s)) => Suffix::Incremental(s.to_owned()),
            (None, None) => Suffix::None,
        };
        let override_version = non_empty(self.override_version.as_deref()).map(str::to_owned);
        if override_version.is_none() && suffix == Suffix::None {
            return None;
        }
        Some(VersionPolicy {
            override_version,
            suffix,
            preserve_snapshot: self.preserve_snapshot,
        })
    }

    /// The configured suffix label without any trailing build number
    /// (`"redhat-1"` → `"redhat"`).
    #[must_use]
    pub fn suffix_label(&self) -> Option<String> {
        let raw = non_empty(self.suffix.as_deref())
            .or_else(|| non_empty(self.incremental_suffix.as_deref()))?;
        let label = match raw.rsplit_once('-') {
            Some((label, digits))
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                label
            }
            _ => raw,
        };
        Some(label.to_owned())
    }
}

const fn default_true() -> bool {
    true
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// AlignmentConfig
// ---------------------------------------------------------------------------

/// Dependency alignment settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignmentConfig {
    /// Which override source wins (default: `rest-then-bom`).
    #[serde(default)]
    pub precedence: Precedence,

    /// Inject overrides that matched no managed dependency into the
    /// inheritance root's managed dependencies.
    #[serde(default)]
    pub override_transitive: bool,

    /// Replace literal `${project.version}` references (default: `true`).
    #[serde(default = "default_true")]
    pub enforce_project_version: bool,

    /// Abort the pass on a version-property clash instead of rejecting the
    /// later demand.
    #[serde(default)]
    pub fail_on_property_clash: bool,

    /// Post-pass check of declarations sharing an updated property.
    #[serde(default)]
    pub property_validation: ValidationLevel,

    /// Strict alignment.
    #[serde(default)]
    pub strict: StrictConfig,

    /// Explicit per-GA overrides.
    #[serde(default)]
    pub overrides: Vec<ExplicitOverrideConfig>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            precedence: Precedence::default(),
            override_transitive: false,
            enforce_project_version: default_true(),
            fail_on_property_clash: false,
            property_validation: ValidationLevel::default(),
            strict: StrictConfig::default(),
            overrides: Vec::new(),
        }
    }
}

/// Override source precedence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    /// BOM entries only.
    Bom,
    /// REST entries only.
    Rest,
    /// Both; REST wins on a GA collision.
    #[default]
    RestThenBom,
    /// Both; BOM wins on a GA collision.
    BomThenRest,
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bom => write!(f, "bom"),
            Self::Rest => write!(f, "rest"),
            Self::RestThenBom => write!(f, "rest-then-bom"),
            Self::BomThenRest => write!(f, "bom-then-rest"),
        }
    }
}

/// Severity of a post-pass check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationLevel {
    #[default]
    Off,
    Warn,
    Fail,
}

/// Strict alignment settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrictConfig {
    /// Only accept candidates whose core matches the original's.
    #[serde(default)]
    pub enabled: bool,

    /// Abort the pass on a violation instead of skipping the override.
    #[serde(default)]
    pub fail_on_violation: bool,

    /// Also strip a rebuild suffix already present on the original before
    /// comparing (`1.0.redhat-1` may be realigned to `1.0.redhat-2`).
    #[serde(default)]
    pub ignore_suffix: bool,

    /// Rebuild suffix label; defaults to the versioning suffix label.
    #[serde(default)]
    pub rebuild_suffix: Option<String>,

    /// Raw regex matching the rebuild suffix; overrides `rebuild_suffix`.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// One explicit override rule.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplicitOverrideConfig {
    /// `group:artifact` or `group:*`.
    pub target: String,

    /// Module GA the rule applies to (`group:artifact` or `*`); all modules
    /// when absent.
    #[serde(default)]
    pub module: Option<String>,

    /// Version to force. `""` excludes the GA from alignment;
    /// `bom:<name>` takes the version from the named extra BOM.
    pub version: String,
}

// ---------------------------------------------------------------------------
// RemovalConfig / PipelineConfig
// ---------------------------------------------------------------------------

/// Plugins and profiles to remove.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemovalConfig {
    /// Plugin GAs (`group:artifact`).
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Profile ids.
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// One stage of the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Versioning,
    Dependencies,
    PropertyInjection,
    PluginRemoval,
    ProfileRemoval,
    EnforceProjectVersion,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Versioning => write!(f, "versioning"),
            Self::Dependencies => write!(f, "dependencies"),
            Self::PropertyInjection => write!(f, "property-injection"),
            Self::PluginRemoval => write!(f, "plugin-removal"),
            Self::ProfileRemoval => write!(f, "profile-removal"),
            Self::EnforceProjectVersion => write!(f, "enforce-project-version"),
        }
    }
}

/// Stage ordering.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Stages in execution order. Stages left out do not run.
    #[serde(default = "default_stages")]
    pub stages: Vec<StageKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

fn default_stages() -> Vec<StageKind> {
    vec![
        StageKind::Versioning,
        StageKind::Dependencies,
        StageKind::PropertyInjection,
        StageKind::PluginRemoval,
        StageKind::ProfileRemoval,
        StageKind::EnforceProjectVersion,
    ]
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }
}

impl RealignConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// Label of the rebuild suffix used by strict checks and partial
    /// property rewrites: `alignment.strict.rebuild_suffix`, else the
    /// versioning suffix label.
    #[must_use]
    pub fn rebuild_label(&self) -> Option<String> {
        non_empty(self.alignment.strict.rebuild_suffix.as_deref())
            .map(str::to_owned)
            .or_else(|| self.versioning.suffix_label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
