use async_trait::async_trait;
use std::fmt::Debug;

use crate::core_types::{Credits, UserId};

/// External payment check performed before a recharge touches the ledger.
///
/// Implementations talk to a payment provider. Returning `Err(reason)` turns
/// the recharge into `PaymentVerificationFailed` with no ledger write.
#[async_trait]
pub trait PaymentVerifier: Send + Sync + Debug {
    /// Provider name, for logging
    fn name(&self) -> &'static str;

    async fn verify(
        &self,
        user_id: UserId,
        external_tx_id: &str,
        amount: Credits,
        source: &str,
    ) -> Result<(), String>;
}

/// Accepts every payment. Default until a real provider is wired in.
#[derive(Debug, Default)]
pub struct TrustedVerifier;

#[async_trait]
impl PaymentVerifier for TrustedVerifier {
    fn name(&self) -> &'static str {
        "trusted"
    }

    async fn verify(
        &self,
        _user_id: UserId,
        _external_tx_id: &str,
        _amount: Credits,
        _source: &str,
    ) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trusted_verifier_accepts() {
        let v = TrustedVerifier;
        assert!(v.verify(1, "pay_1", 100, "purchase").await.is_ok());
        assert_eq!(v.name(), "trusted");
    }
}
