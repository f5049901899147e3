//! The single global boost price and its symmetry check.

use anyhow::Result;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use oxum_config::PricingConfig;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The offered price differs from the global price.
    #[error("boost price {actual} does not match the global boost price {expected}")]
    Mismatch { expected: Decimal, actual: Decimal },
    /// The price source could not produce a price.
    #[error("global boost price unavailable: {0}")]
    Unavailable(String),
}

/// Where the authoritative boost price comes from.
pub trait PriceSource: Send + Sync {
    fn global_boost_price(&self) -> Result<Decimal>;
}

/// A price fixed at construction, normally taken from [`PricingConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPriceSource(pub Decimal);

impl From<&PricingConfig> for FixedPriceSource {
    fn from(config: &PricingConfig) -> Self {
        Self(config.global_boost_price)
    }
}

impl PriceSource for FixedPriceSource {
    fn global_boost_price(&self) -> Result<Decimal> {
        Ok(self.0)
    }
}

pub struct GlobalPricing<S = FixedPriceSource> {
    source: S,
}

impl GlobalPricing<FixedPriceSource> {
    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(FixedPriceSource::from(config))
    }
}

impl<S: PriceSource> GlobalPricing<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn global_boost_price(&self) -> Result<Decimal, PricingError> {
        self.source
            .global_boost_price()
            .map_err(|err| PricingError::Unavailable(format!("{err:#}")))
    }

    /// Accept `price` only when it equals the global price exactly.
    /// Scale is ignored: `15` and `15.00` are the same price.
    pub fn validate_global_price(&self, price: Decimal) -> Result<(), PricingError> {
        let expected = self.global_boost_price()?;
        if price != expected {
            return Err(PricingError::Mismatch {
                expected,
                actual: price,
            });
        }
        debug!(%price, "boost price matches global price");
        Ok(())
    }
}
