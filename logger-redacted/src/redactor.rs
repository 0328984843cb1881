use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::LoggerConfig;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap();
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
}

/// Number of trailing characters left visible in masked identifiers
const VISIBLE_SUFFIX: usize = 4;

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    /// Replace matches with a short hash so repeated values can be correlated
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            hash_for_correlation: false,
        }
    }
}

/// PII redactor for log values
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// Redactor matching the logging section of the service configuration
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(RedactionConfig {
            enabled: config.redaction_enabled,
            hash_for_correlation: config.hash_for_correlation,
            ..RedactionConfig::default()
        })
    }

    /// Mask all but the last four characters of a policy or member number
    pub fn mask_policy_number(&self, policy_number: &str) -> String {
        if !self.config.enabled {
            return policy_number.to_string();
        }
        let chars: Vec<char> = policy_number.chars().collect();
        let hidden = chars.len().saturating_sub(VISIBLE_SUFFIX);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < hidden { '*' } else { *c })
            .collect()
    }

    /// Redact contact details and SSN-like patterns from free text
    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", "***@***");
        }
        if self.config.redact_ssn {
            result = self.replace(&SSN_REGEX, &result, "SSN", "***-**-****");
        }
        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(***) ***-****");
        }

        result
    }

    fn replace(&self, pattern: &Regex, text: &str, label: &str, mask: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{}[{}]", label, self.hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        // First 8 bytes keep the tag short
        general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_number_masking() {
        let redactor = PiiRedactor::default();
        assert_eq!(redactor.mask_policy_number("POL12345678"), "*******5678");
        assert_eq!(redactor.mask_policy_number("AB1"), "AB1");
    }

    #[test]
    fn test_email_and_phone_redaction() {
        let redactor = PiiRedactor::default();
        let redacted = redactor.redact("Rejected, call john.doe@example.com or (555) 123-4567");
        assert!(!redacted.contains("john.doe"));
        assert!(redacted.contains("***@***"));
        assert!(redacted.contains("(***) ***-****"));
    }

    #[test]
    fn test_ssn_redaction() {
        let redactor = PiiRedactor::default();
        assert_eq!(redactor.redact("member ssn 123-45-6789"), "member ssn ***-**-****");
    }

    #[test]
    fn test_from_logger_config() {
        let hashing = PiiRedactor::from_config(&LoggerConfig {
            hash_for_correlation: true,
            ..LoggerConfig::default()
        });
        let redacted = hashing.redact("ssn 123-45-6789");
        assert!(redacted.starts_with("ssn SSN["));
        assert!(!redacted.contains("6789"));

        let off = PiiRedactor::from_config(&LoggerConfig {
            redaction_enabled: false,
            ..LoggerConfig::default()
        });
        assert_eq!(off.redact("ssn 123-45-6789"), "ssn 123-45-6789");
        assert_eq!(off.mask_policy_number("POL12345678"), "POL12345678");
    }

    #[test]
    fn test_hash_for_correlation_is_stable() {
        let redactor = PiiRedactor::new(RedactionConfig {
            hash_for_correlation: true,
            ..RedactionConfig::default()
        });
        let first = redactor.redact("ssn 123-45-6789");
        let second = redactor.redact("ssn 123-45-6789");
        assert!(first.starts_with("ssn SSN["));
        assert_eq!(first, second);
    }
}
