// Configuration sources: defaults, file, environment
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use tracing::debug;

use crate::error::Result;
use crate::settlement::SettlementConfig;
use crate::validation;

pub const ENV_PREFIX: &str = "RUSTCARE_";

/// Builder that layers configuration sources into a [`SettlementConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a TOML or YAML file; a missing file is skipped
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SettlementConfig::default()));

        if let Some(path) = &self.file {
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
            figment = if is_yaml {
                figment.merge(Yaml::file(path))
            } else {
                figment.merge(Toml::file(path))
            };
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate the layered configuration
    pub fn load(&self) -> Result<SettlementConfig> {
        let config: SettlementConfig = self.figment().extract()?;
        validation::validate(&config)?;
        debug!(
            claim_number_prefix = %config.claim_number_prefix,
            wallet_debt_allowed = config.wallet_debt_allowed,
            admission_debt_allowed = config.admission_debt_allowed,
            "Settlement configuration loaded"
        );
        Ok(config)
    }

    /// Load the configuration and install the global tracing subscriber from
    /// its `logging` section
    ///
    /// Call once at process start.
    pub fn init(&self) -> Result<SettlementConfig> {
        let config = self.load()?;
        logger_redacted::init_tracing(&config.logging)?;
        Ok(config)
    }
}
