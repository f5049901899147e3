use serde::{Deserialize, Serialize};

/// Transaction types that move money directly between two users.
const USER_TO_USER_TYPES: &[&str] = &[
    "booking",
    "tip",
    "gift",
    "direct_payment",
    "content_purchase",
    "message_payment",
    "escort_service",
];
const USER_TO_USER_MARKERS: &[&str] = &["user_to_user", "p2p"];

/// Any type containing this marker buys visibility: `boost`,
/// `boost_purchase`, `ai_boost`, `profile_boost`, `post_boost`, `ad_boost`.
const BOOST_MARKER: &str = "boost";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    UserToUser,
    Boost,
    Other,
}

impl TransactionCategory {
    /// User-to-user takes precedence when a type matches both lists
    /// (e.g. `p2p_boost`), so the zero-fee rule is never skipped.
    pub fn of(transaction_type: &str) -> Self {
        if is_user_to_user_transaction(transaction_type) {
            Self::UserToUser
        } else if is_boost_transaction(transaction_type) {
            Self::Boost
        } else {
            Self::Other
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::UserToUser => {
                "Direct transfer between users. Oxum rule: no platform fee is taken."
            }
            Self::Boost => "Visibility boost purchase at the single global boost price.",
            Self::Other => "Platform transaction.",
        }
    }
}

pub fn is_user_to_user_transaction(transaction_type: &str) -> bool {
    let normalized = transaction_type.trim().to_ascii_lowercase();
    USER_TO_USER_TYPES.contains(&normalized.as_str())
        || USER_TO_USER_MARKERS.iter().any(|m| normalized.contains(m))
}

pub fn is_boost_transaction(transaction_type: &str) -> bool {
    let normalized = transaction_type.trim().to_ascii_lowercase();
    normalized.contains(BOOST_MARKER)
}

/// Display metadata for a transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub label: String,
    pub description: String,
    pub is_user_to_user: bool,
    pub is_boost: bool,
}

pub fn get_transaction_descriptor(transaction_type: &str) -> TransactionDescriptor {
    let category = TransactionCategory::of(transaction_type);
    TransactionDescriptor {
        label: title_case(transaction_type),
        description: category.description().to_string(),
        is_user_to_user: is_user_to_user_transaction(transaction_type),
        is_boost: is_boost_transaction(transaction_type),
    }
}

/// `"boost_purchase"` → `"Boost Purchase"`.
fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_user_to_user_types() {
        for t in USER_TO_USER_TYPES {
            assert!(is_user_to_user_transaction(t), "{t}");
        }
        assert!(is_user_to_user_transaction("TIP"));
        assert!(is_user_to_user_transaction(" Booking "));
    }

    #[test]
    fn user_to_user_markers_match_as_substrings() {
        assert!(is_user_to_user_transaction("wallet_user_to_user_transfer"));
        assert!(is_user_to_user_transaction("P2P_Transfer"));
        assert!(!is_user_to_user_transaction("subscription"));
        assert!(!is_user_to_user_transaction("tipjar_refund"));
    }

    #[test]
    fn boost_types_and_marker() {
        for t in ["boost", "boost_purchase", "ai_boost", "profile_boost", "post_boost", "ad_boost"] {
            assert!(is_boost_transaction(t), "{t}");
        }
        assert!(is_boost_transaction("Story_BOOST_weekly"));
        assert!(!is_boost_transaction("withdrawal"));
    }

    #[test]
    fn category_prefers_user_to_user() {
        assert_eq!(TransactionCategory::of("p2p_boost"), TransactionCategory::UserToUser);
        assert_eq!(TransactionCategory::of("ad_boost"), TransactionCategory::Boost);
        assert_eq!(TransactionCategory::of("deposit"), TransactionCategory::Other);
        assert_eq!(TransactionCategory::of(""), TransactionCategory::Other);
    }

    #[test]
    fn descriptor_labels_are_title_cased() {
        let d = get_transaction_descriptor("boost_purchase");
        assert_eq!(d.label, "Boost Purchase");
        assert!(d.is_boost);
        assert!(!d.is_user_to_user);
        assert_eq!(d.description, TransactionCategory::Boost.description());

        assert_eq!(get_transaction_descriptor("DIRECT_PAYMENT").label, "Direct Payment");
        assert_eq!(get_transaction_descriptor("tip").label, "Tip");
        assert_eq!(get_transaction_descriptor("").label, "");
    }

    #[test]
    fn descriptor_for_other_types() {
        let d = get_transaction_descriptor("token_deposit");
        assert_eq!(d.label, "Token Deposit");
        assert!(!d.is_boost && !d.is_user_to_user);
        assert_eq!(d.description, "Platform transaction.");
    }
}
