use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use oxum_config::PricingConfig;

use crate::classify::{self, TransactionCategory, TransactionDescriptor};
use crate::pricing::{FixedPriceSource, GlobalPricing, PriceSource, PricingError};

const SYSTEM_ERROR: &str = "System error while checking Oxum rules; the transaction was not accepted";

/// A transaction about to be written, as submitted by a payment flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OxumTransactionData {
    pub amount: Decimal,
    pub transaction_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default)]
    pub metadata: TransactionMetadata,
}

impl OxumTransactionData {
    pub fn new(amount: Decimal, transaction_type: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type: transaction_type.into(),
            sender: None,
            recipient: None,
            metadata: TransactionMetadata::default(),
        }
    }

    pub fn with_platform_fee(mut self, fee: Decimal) -> Self {
        self.metadata.platform_fee = Some(fee);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_fee: Option<Decimal>,
    /// Everything else the caller attached; carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a rule check.  Rejections are values, never errors: callers
/// branch on `success` / `is_oxum_compliant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_oxum_compliant: bool,
}

impl ValidationResult {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            is_oxum_compliant: true,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            is_oxum_compliant: false,
        }
    }
}

/// Side channel for failures that need an operator's attention.
pub trait Notifier: Send + Sync {
    fn system_error(&self, context: &str, detail: &str);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn system_error(&self, context: &str, detail: &str) {
        error!(context, detail, "oxum rule enforcement system error");
    }
}

pub struct OxumRuleEnforcement<S = FixedPriceSource> {
    pricing: GlobalPricing<S>,
    notifier: Arc<dyn Notifier>,
}

impl OxumRuleEnforcement<FixedPriceSource> {
    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(GlobalPricing::from_config(config), Arc::new(TracingNotifier))
    }
}

impl<S: PriceSource> OxumRuleEnforcement<S> {
    pub fn new(pricing: GlobalPricing<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self { pricing, notifier }
    }

    pub fn get_global_boost_price(&self) -> Result<Decimal, PricingError> {
        self.pricing.global_boost_price()
    }

    pub fn is_user_to_user_transaction(&self, transaction_type: &str) -> bool {
        classify::is_user_to_user_transaction(transaction_type)
    }

    pub fn is_boost_transaction(&self, transaction_type: &str) -> bool {
        classify::is_boost_transaction(transaction_type)
    }

    pub fn get_transaction_descriptor(&self, transaction_type: &str) -> TransactionDescriptor {
        classify::get_transaction_descriptor(transaction_type)
    }

    pub fn validate_transaction(&self, data: &OxumTransactionData) -> ValidationResult {
        let category = TransactionCategory::of(&data.transaction_type);
        debug!(
            transaction_type = %data.transaction_type,
            ?category,
            amount = %data.amount,
            "validating transaction against oxum rules"
        );

        match category {
            TransactionCategory::UserToUser => self.check_zero_fee(data),
            TransactionCategory::Boost => self.check_boost_price(data),
            TransactionCategory::Other => ValidationResult::accepted("Transaction accepted"),
        }
    }

    fn check_zero_fee(&self, data: &OxumTransactionData) -> ValidationResult {
        match data.metadata.platform_fee.filter(|fee| *fee > Decimal::ZERO) {
            Some(fee) => {
                warn!(
                    transaction_type = %data.transaction_type,
                    %fee,
                    "rejected platform fee on user-to-user transaction"
                );
                ValidationResult::rejected(format!(
                    "Oxum rule violation: user-to-user transactions must carry zero platform fee (got {fee})"
                ))
            }
            None => ValidationResult::accepted("User-to-user transaction accepted with zero platform fee"),
        }
    }

    fn check_boost_price(&self, data: &OxumTransactionData) -> ValidationResult {
        match self.pricing.validate_global_price(data.amount.abs()) {
            Ok(()) => ValidationResult::accepted("Boost price matches the global boost price"),
            Err(err @ PricingError::Mismatch { .. }) => {
                warn!(
                    transaction_type = %data.transaction_type,
                    amount = %data.amount,
                    "rejected boost with non-global price"
                );
                ValidationResult::rejected(format!("Oxum price symmetry violation: {err}"))
            }
            Err(err @ PricingError::Unavailable(_)) => {
                self.notifier
                    .system_error("validate_transaction", &err.to_string());
                ValidationResult::rejected(SYSTEM_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn system_error(&self, context: &str, detail: &str) {
            self.alerts
                .lock()
                .unwrap()
                .push((context.to_string(), detail.to_string()));
        }
    }

    struct OfflineSource;

    impl PriceSource for OfflineSource {
        fn global_boost_price(&self) -> anyhow::Result<Decimal> {
            Err(anyhow!("price service timed out"))
        }
    }

    fn enforcement() -> OxumRuleEnforcement {
        OxumRuleEnforcement::from_config(&PricingConfig::default())
    }

    #[test]
    fn tip_with_platform_fee_is_rejected() {
        let tx = OxumTransactionData::new(dec!(100), "tip").with_platform_fee(dec!(5));
        let result = enforcement().validate_transaction(&tx);
        assert!(!result.success);
        assert!(!result.is_oxum_compliant);
        assert!(result.error.as_deref().is_some_and(|e| e.contains("zero platform fee")));
    }

    #[test]
    fn tip_without_or_with_zero_fee_is_accepted() {
        let e = enforcement();
        let bare = e.validate_transaction(&OxumTransactionData::new(dec!(100), "tip"));
        assert!(bare.success && bare.is_oxum_compliant);

        let zero = e.validate_transaction(
            &OxumTransactionData::new(dec!(100), "p2p_transfer").with_platform_fee(Decimal::ZERO),
        );
        assert!(zero.success && zero.is_oxum_compliant);
    }

    #[test]
    fn boost_at_global_price_is_compliant() {
        let e = enforcement();
        let price = e.get_global_boost_price().unwrap();
        let result = e.validate_transaction(&OxumTransactionData::new(price, "boost_purchase"));
        assert!(result.success);
        assert!(result.is_oxum_compliant);
        assert_eq!(result.error, None);
    }

    #[test]
    fn boost_off_global_price_is_rejected() {
        let e = enforcement();
        let price = e.get_global_boost_price().unwrap();
        let result = e.validate_transaction(&OxumTransactionData::new(price + dec!(1), "boost_purchase"));
        assert!(!result.success);
        assert!(!result.is_oxum_compliant);
        assert!(result.error.as_deref().is_some_and(|e| e.contains("price symmetry")));
    }

    #[test]
    fn boost_debit_is_checked_by_absolute_value() {
        let result = enforcement().validate_transaction(&OxumTransactionData::new(dec!(-15), "profile_boost"));
        assert!(result.is_oxum_compliant);
    }

    #[test]
    fn classification_is_available_on_the_validator() {
        let e = enforcement();
        assert!(e.is_user_to_user_transaction("tip"));
        assert!(!e.is_user_to_user_transaction("ad_boost"));
        assert!(e.is_boost_transaction("ad_boost"));
        assert!(!e.is_boost_transaction("withdrawal"));

        let descriptor = e.get_transaction_descriptor("p2p_transfer");
        assert_eq!(descriptor.label, "P2p Transfer");
        assert!(descriptor.is_user_to_user);
        assert_eq!(descriptor, crate::get_transaction_descriptor("p2p_transfer"));
    }

    #[test]
    fn other_types_pass_without_checks() {
        let tx = OxumTransactionData::new(dec!(-3), "withdrawal").with_platform_fee(dec!(1));
        let result = enforcement().validate_transaction(&tx);
        assert!(result.success && result.is_oxum_compliant);
    }

    #[test]
    fn price_source_failure_notifies_and_returns_generic_error() {
        let notifier = Arc::new(RecordingNotifier::default());
        let e = OxumRuleEnforcement::new(GlobalPricing::new(OfflineSource), notifier.clone());

        let result = e.validate_transaction(&OxumTransactionData::new(dec!(15), "boost"));
        assert!(!result.success);
        assert!(!result.is_oxum_compliant);
        assert_eq!(result.error.as_deref(), Some(SYSTEM_ERROR));

        let alerts = notifier.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].0, "validate_transaction");
        assert!(alerts[0].1.contains("price service timed out"));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let raw = r#"{
            "amount": 100,
            "transactionType": "tip",
            "recipient": "creator-7",
            "metadata": { "platformFee": 5, "bookingId": "b-1" }
        }"#;
        let tx: OxumTransactionData = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.metadata.platform_fee, Some(dec!(5)));
        assert_eq!(tx.metadata.extra.get("bookingId"), Some(&serde_json::json!("b-1")));

        let result = enforcement().validate_transaction(&tx);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isOxumCompliant"], serde_json::json!(false));
        assert!(json.get("message").is_none());
    }
}
