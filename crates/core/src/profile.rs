use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score inputs for one boosted profile.
///
/// | Field                 | Meaning                                                    |
/// |-----------------------|------------------------------------------------------------|
/// | `base_score`          | Quality signal supplied by the caller (opaque here)        |
/// | `boost_credits`       | Purchased boost allowance, decremented externally          |
/// | `time_since_last_top` | Hours since the profile last held the top rotation slot    |
/// | `last_calculated`     | When `time_since_last_top` was last brought up to date     |
/// | `repetition_penalty`  | Ranking multiplier in `(0, 1]`; `1.0` means unpenalized    |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileScoreData {
    pub profile_id: String,
    pub base_score: f64,
    pub boost_credits: f64,
    pub time_since_last_top: f64,
    pub last_calculated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "unpenalized")]
    pub repetition_penalty: f64,
}

fn unpenalized() -> f64 {
    1.0
}

impl ProfileScoreData {
    /// A freshly boosted profile: no waiting time accrued, no penalty.
    pub fn new(
        profile_id: impl Into<String>,
        base_score: f64,
        boost_credits: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            base_score,
            boost_credits,
            time_since_last_top: 0.0,
            last_calculated: now,
            region: None,
            language: None,
            repetition_penalty: unpenalized(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn is_penalized(&self) -> bool {
        self.repetition_penalty < 1.0
    }
}

/// Per-profile lifecycle: `Inactive -> Active -> Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Inactive,
    Active,
}

/// Query-time restriction of the boost queue.
///
/// A `None` field places no restriction.  Present fields must match exactly
/// (case-sensitive); a profile without the attribute never matches a set filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFilters {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl QueueFilters {
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            language: None,
        }
    }

    pub fn language(language: impl Into<String>) -> Self {
        Self {
            region: None,
            language: Some(language.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.language.is_none()
    }

    pub fn matches(&self, profile: &ProfileScoreData) -> bool {
        field_matches(self.region.as_deref(), profile.region.as_deref())
            && field_matches(self.language.as_deref(), profile.language.as_deref())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual == Some(wanted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_profile_starts_unpenalized_with_no_wait() {
        let p = ProfileScoreData::new("p1", 10.0, 5.0, at_noon());
        assert_eq!(p.time_since_last_top, 0.0);
        assert_eq!(p.repetition_penalty, 1.0);
        assert!(!p.is_penalized());
        assert_eq!(p.last_calculated, at_noon());
    }

    #[test]
    fn empty_filters_match_everything() {
        let p = ProfileScoreData::new("p1", 1.0, 0.0, at_noon());
        assert!(QueueFilters::default().is_empty());
        assert!(QueueFilters::default().matches(&p));
    }

    #[test]
    fn filters_are_exact_and_case_sensitive() {
        let p = ProfileScoreData::new("p1", 1.0, 0.0, at_noon())
            .with_region("EU")
            .with_language("en");
        assert!(QueueFilters::region("EU").matches(&p));
        assert!(!QueueFilters::region("eu").matches(&p));
        assert!(QueueFilters::language("en").matches(&p));
        assert!(!QueueFilters::language("EN").matches(&p));
    }

    #[test]
    fn set_filter_excludes_profiles_without_the_attribute() {
        let p = ProfileScoreData::new("p1", 1.0, 0.0, at_noon());
        assert!(!QueueFilters::region("EU").matches(&p));
    }

    #[test]
    fn wire_format_is_camel_case_and_penalty_defaults() {
        let raw = r#"{
            "profileId": "abc",
            "baseScore": 12.5,
            "boostCredits": 3.0,
            "timeSinceLastTop": 1.5,
            "lastCalculated": "2025-03-01T12:00:00Z",
            "region": "US"
        }"#;
        let p: ProfileScoreData = serde_json::from_str(raw).unwrap();
        assert_eq!(p.profile_id, "abc");
        assert_eq!(p.region.as_deref(), Some("US"));
        assert_eq!(p.language, None);
        assert_eq!(p.repetition_penalty, 1.0);

        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("timeSinceLastTop").is_some());
        assert!(json.get("language").is_none());
    }
}
