use anyhow::{Result, bail};
use rust_decimal::Decimal;

use oxum_config::OxumConfig;
use oxum_rules::{OxumRuleEnforcement, OxumTransactionData, get_transaction_descriptor};

pub(crate) struct ValidateArgs {
    pub transaction_type: String,
    pub amount: Decimal,
    pub platform_fee: Option<Decimal>,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl ValidateArgs {
    fn into_transaction(self) -> OxumTransactionData {
        let mut tx = OxumTransactionData::new(self.amount, self.transaction_type);
        tx.sender = self.sender;
        tx.recipient = self.recipient;
        tx.metadata.platform_fee = self.platform_fee;
        tx
    }
}

pub(crate) fn validate(config: &OxumConfig, args: ValidateArgs) -> Result<()> {
    let enforcement = OxumRuleEnforcement::from_config(&config.pricing);
    let result = enforcement.validate_transaction(&args.into_transaction());
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_oxum_compliant {
        bail!("transaction violates the Oxum rules");
    }
    Ok(())
}

pub(crate) fn describe(transaction_type: &str) -> Result<()> {
    let descriptor = get_transaction_descriptor(transaction_type);
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_transaction() {
        let tx = ValidateArgs {
            transaction_type: "tip".into(),
            amount: Decimal::from(100),
            platform_fee: Some(Decimal::from(5)),
            sender: Some("fan-1".into()),
            recipient: None,
        }
        .into_transaction();
        assert_eq!(tx.transaction_type, "tip");
        assert_eq!(tx.metadata.platform_fee, Some(Decimal::from(5)));
        assert_eq!(tx.sender.as_deref(), Some("fan-1"));
    }

    #[test]
    fn non_compliant_transaction_is_an_error_exit() {
        let args = ValidateArgs {
            transaction_type: "boost".into(),
            amount: Decimal::from(1),
            platform_fee: None,
            sender: None,
            recipient: None,
        };
        assert!(validate(&OxumConfig::default(), args).is_err());
    }
}
