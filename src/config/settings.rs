use super::SettingsError;
use crate::runner::{CancelToken, RunControl, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    #[default]
    Cwl,
    Shell,
    MlToolbox,
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cwl => "cwl",
            Self::Shell => "shell",
            Self::MlToolbox => "ml_toolbox",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cwl" => Ok(Self::Cwl),
            "shell" => Ok(Self::Shell),
            "ml_toolbox" => Ok(Self::MlToolbox),
            _ => Err("adapter must be one of: cwl, shell, ml_toolbox".to_string()),
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a non-zero exit code from the external tool means for the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// The job fails with `ExternalProcess`.
    Fatal,
    /// A warning is logged and whatever outputs exist are still reported.
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    #[default]
    Local,
    WorkerThread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    #[default]
    Yaml,
    Json,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yml",
            Self::Json => "json",
        }
    }
}

/// Types stamped on every output regardless of what the job declared.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FixedOutputType {
    pub data_type: String,
    pub file_type: String,
}

/// Per-adapter settings, loaded once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub adapter: AdapterKind,
    /// Executable to launch; each adapter has its own default.
    #[serde(default)]
    pub binary: Option<String>,
    /// Argv template for the shell adapter.
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub exit_policy: Option<ExitPolicy>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub executor: ExecutorKind,
    #[serde(default)]
    pub artifact_format: ArtifactFormat,
    #[serde(default)]
    pub extra_masked_keys: Vec<String>,
    #[serde(default)]
    pub fixed_output_type: Option<FixedOutputType>,
    /// Argument values used when the job descriptor does not set them.
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
    /// Section defaults the ML toolbox overrides are overlaid on.
    #[serde(default)]
    pub toolbox_defaults: Map<String, Value>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::default(),
            binary: None,
            command: Vec::new(),
            exit_policy: None,
            timeout_secs: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            executor: ExecutorKind::default(),
            artifact_format: ArtifactFormat::default(),
            extra_masked_keys: Vec::new(),
            fixed_output_type: None,
            defaults: BTreeMap::new(),
            toolbox_defaults: Map::new(),
        }
    }
}

impl ToolSettings {
    pub fn for_adapter(adapter: AdapterKind) -> Self {
        Self {
            adapter,
            ..Self::default()
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw, &path.display().to_string())
    }

    pub fn from_yaml_str(raw: &str, origin: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: origin.to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(SettingsError::Invalid(
                "timeout_secs must be greater than zero when set".to_string(),
            ));
        }
        if self.adapter == AdapterKind::Shell && self.command.is_empty() {
            return Err(SettingsError::Invalid(
                "shell adapter requires a non-empty `command` template".to_string(),
            ));
        }
        if matches!(&self.binary, Some(binary) if binary.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "binary must be non-empty when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn run_control(&self, cancel: CancelToken) -> RunControl {
        RunControl {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_secs.map(Duration::from_secs),
            cancel,
        }
    }
}
