use rand::Rng;

/// Source of candidate claim numbers
///
/// Candidates need not be unique; the ledger retries on collision.
pub trait ClaimNumberGenerator: Send + Sync {
    fn next_claim_number(&self) -> String;
}

/// `<PREFIX>-<8 uppercase hex digits>` from the thread-local RNG
#[derive(Debug, Clone)]
pub struct RandomClaimNumbers {
    prefix: String,
}

impl RandomClaimNumbers {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl ClaimNumberGenerator for RandomClaimNumbers {
    fn next_claim_number(&self) -> String {
        let suffix: u32 = rand::thread_rng().gen();
        format!("{}-{:08X}", self.prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let number = RandomClaimNumbers::new("CLM").next_claim_number();
        assert_eq!(number.len(), "CLM-".len() + 8);
        assert!(number.starts_with("CLM-"));
        assert!(number["CLM-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
