// Semantic checks that serde cannot express
use crate::error::{ConfigError, Result};
use crate::settlement::SettlementConfig;

const MAX_PREFIX_LEN: usize = 8;

pub fn validate(config: &SettlementConfig) -> Result<()> {
    let prefix = config.claim_number_prefix.trim();
    if prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "claim_number_prefix must not be empty".to_string(),
        ));
    }
    if prefix.len() > MAX_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::ValidationError(format!(
            "claim_number_prefix must be 1-{MAX_PREFIX_LEN} ASCII alphanumerics, got {prefix:?}"
        )));
    }
    if config.claim_number_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "claim_number_attempts must be at least 1".to_string(),
        ));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&SettlementConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let config = SettlementConfig {
            claim_number_attempts: 0,
            ..SettlementConfig::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_bad_prefix() {
        for prefix in ["", "  ", "CLM-", "TOOLONGPREFIX"] {
            let config = SettlementConfig {
                claim_number_prefix: prefix.to_string(),
                ..SettlementConfig::default()
            };
            assert!(validate(&config).is_err(), "prefix {prefix:?} should be rejected");
        }
    }
}
