//! Ledger Core Types
//!
//! Records persisted by the balance store and the transaction log, plus the
//! request/response DTOs exposed through the currency API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core_types::{Credits, MemoId, UserId};

/// Source tag recorded when a recharge does not name one
pub const DEFAULT_RECHARGE_SOURCE: &str = "purchase";

/// Column widths of `currency_transactions_tb.external_tx_id` / `.source`
pub const MAX_EXTERNAL_TX_ID_LEN: usize = 128;
pub const MAX_SOURCE_LEN: usize = 64;

/// Prefix of every internal transaction id
const TX_ID_PREFIX: &str = "tx_";

/// Internal transaction id - ULID-based, rendered as `tx_<ULID>`.
///
/// Generated once per ledger mutation, never reused, and distinct from any
/// externally supplied recharge id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(ulid::Ulid);

impl TransactionId {
    /// Generate a new unique TransactionId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TX_ID_PREFIX, self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(TX_ID_PREFIX).unwrap_or(s);
        Ok(Self(ulid::Ulid::from_string(raw)?))
    }
}

/// Kind of ledger-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deduct,
    Recharge,
}

impl TransactionKind {
    /// Storage / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deduct => "deduct",
            TransactionKind::Recharge => "recharge",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deduct" => Ok(TransactionKind::Deduct),
            "recharge" => Ok(TransactionKind::Recharge),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

/// Per-user balance row (exactly one per user)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    pub user_id: UserId,
    pub balance: Credits,
    pub last_update_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// Fresh zero balance, as created on first access
    pub fn zero(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            balance: 0,
            last_update_time: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only transaction log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Always positive; direction comes from `kind`
    pub amount: Credits,
    /// Balance right after this entry applied
    pub balance_after: Credits,
    pub reason: String,
    pub memo_id: Option<MemoId>,
    /// Idempotence key, recharge rows only
    pub external_tx_id: Option<String>,
    /// Recharge rows only
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn deduct(
        user_id: UserId,
        amount: Credits,
        balance_after: Credits,
        reason: String,
        memo_id: Option<MemoId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            user_id,
            kind: TransactionKind::Deduct,
            amount,
            balance_after,
            reason,
            memo_id,
            external_tx_id: None,
            source: None,
            created_at: now,
        }
    }

    pub fn recharge(
        user_id: UserId,
        amount: Credits,
        balance_after: Credits,
        external_tx_id: String,
        source: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            user_id,
            kind: TransactionKind::Recharge,
            amount,
            balance_after,
            reason: recharge_reason(&source),
            memo_id: None,
            external_tx_id: Some(external_tx_id),
            source: Some(source),
            created_at: now,
        }
    }

    /// Balance before this entry applied
    pub fn balance_before(&self) -> Credits {
        match self.kind {
            TransactionKind::Deduct => self.balance_after + self.amount,
            TransactionKind::Recharge => self.balance_after - self.amount,
        }
    }
}

/// Reason text stored on recharge rows
pub fn recharge_reason(source: &str) -> String {
    format!("recharge - {}", source)
}

/// Normalize an optional caller-supplied source tag
pub fn normalize_source(source: Option<&str>) -> String {
    match source.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_RECHARGE_SOURCE.to_string(),
    }
}

// ============================================================================
// API DTOs
// ============================================================================

/// Deduct credits request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeductRequest {
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    #[schema(example = 30)]
    pub amount: Credits,
    #[validate(length(min = 1, message = "reason is required"))]
    #[schema(example = "used by note 42")]
    pub reason: String,
    #[serde(default)]
    pub memo_id: Option<MemoId>,
}

/// Recharge credits request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRequest {
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    #[schema(example = 100)]
    pub amount: Credits,
    /// Externally verified payment transaction id (idempotence key)
    #[validate(length(min = 1, max = 128, message = "transactionId must be 1-128 characters"))]
    #[schema(example = "pay_20261018_0001")]
    pub transaction_id: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "source must be at most 64 characters"))]
    #[schema(example = "purchase")]
    pub source: Option<String>,
}

/// Current balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: Credits,
    pub last_update_time: DateTime<Utc>,
}

impl From<&BalanceRecord> for BalanceResponse {
    fn from(record: &BalanceRecord) -> Self {
        Self {
            balance: record.balance,
            last_update_time: record.last_update_time,
        }
    }
}

/// Result of a committed deduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeductResponse {
    pub remaining_balance: Credits,
    pub deducted_amount: Credits,
    pub transaction_id: String,
}

/// Result of a committed recharge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RechargeResponse {
    pub new_balance: Credits,
    pub recharged_amount: Credits,
    /// Internal transaction id, not the external one
    pub transaction_id: String,
}

/// Error payload attached to an insufficient-funds rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientFundsData {
    pub current_balance: Credits,
    pub required_amount: Credits,
}

/// One history entry as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Credits,
    pub balance_after: Credits,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_id: Option<MemoId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionView {
    fn from(r: TransactionRecord) -> Self {
        Self {
            transaction_id: r.transaction_id.to_string(),
            kind: r.kind,
            amount: r.amount,
            balance_after: r.balance_after,
            reason: r.reason,
            memo_id: r.memo_id,
            external_transaction_id: r.external_tx_id,
            source: r.source,
            created_at: r.created_at,
        }
    }
}

/// Paged transaction history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionPage {
    pub list: Vec<TransactionView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_display_and_parse() {
        let id = TransactionId::new();
        let text = id.to_string();
        assert!(text.starts_with("tx_"));
        assert_eq!(text.parse::<TransactionId>().unwrap(), id);
        // Bare ULIDs are accepted too
        assert_eq!(id.inner().to_string().parse::<TransactionId>().unwrap(), id);
    }

    #[test]
    fn test_transaction_ids_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("deduct".parse::<TransactionKind>(), Ok(TransactionKind::Deduct));
        assert_eq!(
            "recharge".parse::<TransactionKind>(),
            Ok(TransactionKind::Recharge)
        );
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source(None), "purchase");
        assert_eq!(normalize_source(Some("  ")), "purchase");
        assert_eq!(normalize_source(Some("promo")), "promo");
    }

    #[test]
    fn test_recharge_record_fields() {
        let now = Utc::now();
        let rec = TransactionRecord::recharge(7, 100, 150, "ext-1".into(), "promo".into(), now);
        assert_eq!(rec.kind, TransactionKind::Recharge);
        assert_eq!(rec.reason, "recharge - promo");
        assert_eq!(rec.external_tx_id.as_deref(), Some("ext-1"));
        assert_eq!(rec.balance_before(), 50);
    }

    #[test]
    fn test_deduct_record_balance_before() {
        let rec = TransactionRecord::deduct(7, 30, 70, "note use".into(), Some(3), Utc::now());
        assert_eq!(rec.balance_before(), 100);
        assert!(rec.external_tx_id.is_none());
        assert!(rec.source.is_none());
    }

    #[test]
    fn test_deduct_request_validation() {
        let ok: DeductRequest =
            serde_json::from_str(r#"{"amount":5,"reason":"x","memoId":9}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.memo_id, Some(9));

        let zero: DeductRequest = serde_json::from_str(r#"{"amount":0,"reason":"x"}"#).unwrap();
        assert!(zero.validate().is_err());

        let empty: DeductRequest = serde_json::from_str(r#"{"amount":1,"reason":""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_recharge_request_camel_case() {
        let req: RechargeRequest =
            serde_json::from_str(r#"{"amount":100,"transactionId":"tx1"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.transaction_id, "tx1");
        assert!(req.source.is_none());
    }

    #[test]
    fn test_recharge_request_source_length() {
        let long = format!(
            r#"{{"amount":10,"transactionId":"tx1","source":"{}"}}"#,
            "s".repeat(MAX_SOURCE_LEN + 1)
        );
        let req: RechargeRequest = serde_json::from_str(&long).unwrap();
        let errs = req.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("source"));

        let long_id = format!(
            r#"{{"amount":10,"transactionId":"{}"}}"#,
            "e".repeat(MAX_EXTERNAL_TX_ID_LEN + 1)
        );
        let req: RechargeRequest = serde_json::from_str(&long_id).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_serialization() {
        let resp = DeductResponse {
            remaining_balance: 70,
            deducted_amount: 30,
            transaction_id: "tx_1".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["remainingBalance"], 70);
        assert_eq!(json["deductedAmount"], 30);
        assert_eq!(json["transactionId"], "tx_1");
    }
}
