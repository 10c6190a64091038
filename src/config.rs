pub mod configuration;
pub mod settings;

pub use configuration::{Configuration, MaskedKeys, BASE_MASKED_KEYS, EXECUTION_KEY};
pub use settings::{
    AdapterKind, ArtifactFormat, ExecutorKind, ExitPolicy, FixedOutputType, ToolSettings,
};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Invalid(String),
}
