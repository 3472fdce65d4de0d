//! Journal open options with multi-source loading.
//!
//! Precedence, lowest to highest:
//!
//! 1. Built-in defaults ([`JournalOptions::default`])
//! 2. An optional TOML file
//! 3. `DURAJOURNAL_*` environment variables (e.g. `DURAJOURNAL_MODE=danger`,
//!    `DURAJOURNAL_INITIAL_SIZE=1048576`)

use std::path::{Path, PathBuf};

use durajournal_io::{DurabilitySupport, JournalMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default size a new journal is grown to (64 KiB).
pub const DEFAULT_INITIAL_SIZE: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to load journal options: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid journal options: {0}")]
    Invalid(String),
}

/// Parameters for opening journals for writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalOptions {
    pub mode: JournalMode,
    pub durability: DurabilitySupport,
    pub initial_size: u64,
}

impl Default for JournalOptions {
    fn default() -> Self {
        Self {
            mode: JournalMode::Durable,
            durability: DurabilitySupport::Supported,
            initial_size: DEFAULT_INITIAL_SIZE,
        }
    }
}

impl JournalOptions {
    /// Loads options from defaults, `file` (if given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, OptionsError> {
        let mut loader = OptionsLoader::new();
        if let Some(file) = file {
            loader = loader.with_file(file);
        }
        loader.load()
    }

    /// Checks the options for values that would violate the open contract.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.initial_size == 0 {
            return Err(OptionsError::Invalid(
                "initial_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for loading [`JournalOptions`].
pub struct OptionsLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl OptionsLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: "DURAJOURNAL".to_string(),
        }
    }

    /// Reads options from a TOML file. The file must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the environment variable prefix (default: "DURAJOURNAL").
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(self) -> Result<JournalOptions, OptionsError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&JournalOptions::default())?);

        if let Some(file) = self.file {
            builder = builder.add_source(
                config::File::from(file)
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
        }

        // Field names contain underscores, so nesting uses a double one.
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let options: JournalOptions = builder.build()?.try_deserialize()?;
        options.validate()?;
        Ok(options)
    }
}

impl Default for OptionsLoader {
    fn default() -> Self {
        Self::new()
    }
}
