use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CoreError, CoreResult};

pub const ORDER_ID_LEN: usize = 12;

const SEED_LEN: usize = 16;

/// Locally generated identifier correlating one checkout attempt across the
/// browser, this server and the gateway.
///
/// Twelve lowercase hex characters (48 bits). Uniqueness is probabilistic;
/// nothing checks a generated id against previously issued ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh id from the operating system's random source.
    pub fn generate() -> CoreResult<Self> {
        Self::generate_from(&mut OsRng)
    }

    /// Seed bytes are hex-encoded, hashed with SHA-256, and the hex digest is
    /// cut down to [`ORDER_ID_LEN`] characters. A failing source is an error;
    /// there is no fallback generator.
    pub fn generate_from<R: RngCore + ?Sized>(rng: &mut R) -> CoreResult<Self> {
        let mut seed = [0u8; SEED_LEN];
        rng.try_fill_bytes(&mut seed)
            .map_err(|e| CoreError::RandomSourceUnavailable(e.to_string()))?;

        let digest = Sha256::digest(hex::encode(seed).as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(ORDER_ID_LEN);

        Ok(Self(id))
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        let well_formed = value.len() == ORDER_ID_LEN
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        if !well_formed {
            return Err(CoreError::ValidationError(format!(
                "order id must be {} lowercase hex characters",
                ORDER_ID_LEN
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;

    struct ExhaustedRng;

    impl RngCore for ExhaustedRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source exhausted"))
        }
    }

    #[test]
    fn test_generated_id_format() {
        for _ in 0..100 {
            let id = OrderId::generate().unwrap();
            assert_eq!(id.as_str().len(), ORDER_ID_LEN);
            assert!(id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_no_collisions_over_ten_thousand_ids() {
        let ids: HashSet<OrderId> = (0..10_000)
            .map(|_| OrderId::generate().unwrap())
            .collect();

        // 48 bits of entropy: the birthday bound for 10k draws is ~1.8e-7.
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_same_seed_same_id() {
        let a = OrderId::generate_from(&mut StepRng::new(7, 3)).unwrap();
        let b = OrderId::generate_from(&mut StepRng::new(7, 3)).unwrap();
        let c = OrderId::generate_from(&mut StepRng::new(8, 3)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_exhausted_source_is_an_error() {
        let result = OrderId::generate_from(&mut ExhaustedRng);
        assert!(matches!(result, Err(CoreError::RandomSourceUnavailable(_))));
    }

    #[test]
    fn test_parse() {
        assert!(OrderId::parse("deadbeefcafe").is_ok());
        assert!(OrderId::parse("DEADBEEFCAFE").is_err());
        assert!(OrderId::parse("deadbeef").is_err());
        assert!(OrderId::parse("deadbeefcafg").is_err());
    }

    #[test]
    fn test_serde_rejects_malformed_id() {
        let id: OrderId = serde_json::from_str("\"0123456789ab\"").unwrap();
        assert_eq!(id.to_string(), "0123456789ab");
        assert!(serde_json::from_str::<OrderId>("\"not-an-id\"").is_err());
    }
}
