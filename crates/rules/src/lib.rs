//! Oxum rule enforcement: policy checks run before a transaction is stored.
//!
//! 1. Peer-to-peer transactions never carry a platform fee.
//! 2. Every boost purchase costs the same global price.

pub mod classify;
pub mod enforcement;
pub mod pricing;

pub use classify::{
    TransactionCategory, TransactionDescriptor, get_transaction_descriptor, is_boost_transaction,
    is_user_to_user_transaction,
};
pub use enforcement::{
    Notifier, OxumRuleEnforcement, OxumTransactionData, TracingNotifier, TransactionMetadata,
    ValidationResult,
};
pub use pricing::{FixedPriceSource, GlobalPricing, PriceSource, PricingError};
