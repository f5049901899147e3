//! Composite scoring and fairness helpers for the boost queue.
//!
//! Scoring model:
//! ```text
//! raw   = base + credits(0.5/credit, max 100) + wait(2.0/h × rotation_factor, max 24 h)
//! score = raw - |raw| × (1 - penalty)
//! ```
//! `penalty` is `1.0` for profiles that have not been shown recently and
//! `1 / repetition_penalty_factor` for those that have.  For a positive raw
//! score this is `raw × penalty`; a negative raw score moves further down.
//!
//! Every function here is pure: inputs are borrowed, results are fresh
//! vectors, and empty inputs yield empty outputs.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

use tracing::trace;

use oxum_core::{ProfileScoreData, QueueFilters};

const CREDIT_WEIGHT: f64 = 0.5;
const CREDIT_CAP: f64 = 100.0;
const WAIT_REWARD_PER_HOUR: f64 = 2.0;
const WAIT_REWARD_CAP_HOURS: f64 = 24.0;

const MAX_SLOT_SECS: f64 = 300.0;
const MIN_SLOT_SECS: f64 = 10.0;
/// Number of active profiles that halves the slot length.
const SLOT_CROWD_SIZE: f64 = 10.0;
/// Share of the slot removed at full system load.
const SLOT_LOAD_SHARE: f64 = 0.5;

// ── Composite score ───────────────────────────────────────────────────────────

pub fn compute_composite_score(profile: &ProfileScoreData) -> f64 {
    compute_composite_score_with(profile, 1.0)
}

pub fn compute_composite_score_with(profile: &ProfileScoreData, rotation_factor: f64) -> f64 {
    let credits = profile.boost_credits.clamp(0.0, CREDIT_CAP) * CREDIT_WEIGHT;
    let waited = profile.time_since_last_top.clamp(0.0, WAIT_REWARD_CAP_HOURS);
    let wait_reward = waited * WAIT_REWARD_PER_HOUR * rotation_factor;
    let penalty = profile.repetition_penalty.clamp(0.0, 1.0);

    let raw = profile.base_score + credits + wait_reward;
    let score = raw - raw.abs() * (1.0 - penalty);
    trace!(
        profile_id = %profile.profile_id,
        base = profile.base_score,
        credits,
        wait_reward,
        penalty,
        score,
        "scored boosted profile"
    );
    score
}

// ── Ordering ──────────────────────────────────────────────────────────────────

/// Filter by `filters` (if any) and order by descending composite score,
/// breaking ties by ascending `profile_id`.
pub fn sort_profiles_by_score(
    profiles: &[ProfileScoreData],
    filters: Option<&QueueFilters>,
) -> Vec<ProfileScoreData> {
    sort_profiles_by_score_with(profiles, filters, 1.0)
}

pub fn sort_profiles_by_score_with(
    profiles: &[ProfileScoreData],
    filters: Option<&QueueFilters>,
    rotation_factor: f64,
) -> Vec<ProfileScoreData> {
    let mut scored: Vec<(f64, &ProfileScoreData)> = profiles
        .iter()
        .filter(|p| filters.is_none_or(|f| f.matches(p)))
        .map(|p| (compute_composite_score_with(p, rotation_factor), p))
        .collect();

    scored.sort_by(|(ls, lp), (rs, rp)| rank_order(*ls, &lp.profile_id, *rs, &rp.profile_id));
    scored.into_iter().map(|(_, p)| p.clone()).collect()
}

pub(crate) fn rank_order(l_score: f64, l_id: &str, r_score: f64, r_id: &str) -> Ordering {
    r_score.total_cmp(&l_score).then_with(|| l_id.cmp(r_id))
}

// ── Repetition penalty ────────────────────────────────────────────────────────

/// Down-weight every profile whose id is in `recently_viewed`.
///
/// The penalty is set, not compounded: applying this twice with the same
/// inputs gives the same result.  `time_since_last_top` is never touched.
pub fn apply_repetition_penalty(
    profiles: &[ProfileScoreData],
    recently_viewed: &HashSet<String>,
    penalty_factor: f64,
) -> Vec<ProfileScoreData> {
    profiles
        .iter()
        .cloned()
        .map(|mut p| {
            if recently_viewed.contains(&p.profile_id) {
                p.repetition_penalty = penalty_multiplier(penalty_factor);
            }
            p
        })
        .collect()
}

/// Clear the penalty of every profile that has waited more than
/// `reset_threshold_hours` since its last top slot.
pub fn reset_repetition_penalties(
    profiles: &[ProfileScoreData],
    reset_threshold_hours: f64,
) -> Vec<ProfileScoreData> {
    profiles
        .iter()
        .cloned()
        .map(|mut p| {
            if waited_past_threshold(&p, reset_threshold_hours) {
                p.repetition_penalty = 1.0;
            }
            p
        })
        .collect()
}

pub(crate) fn penalty_multiplier(penalty_factor: f64) -> f64 {
    if penalty_factor > 1.0 {
        1.0 / penalty_factor
    } else {
        1.0
    }
}

pub(crate) fn waited_past_threshold(profile: &ProfileScoreData, reset_threshold_hours: f64) -> bool {
    profile.time_since_last_top > reset_threshold_hours
}

// ── Slot duration ─────────────────────────────────────────────────────────────

/// How long one rotation slot should last.
///
/// Shrinks as more profiles compete and as load rises; always within
/// 10 s ..= 300 s.  Non-finite loads count as idle.
pub fn calculate_fair_boost_duration(active_profile_count: usize, system_load: f64) -> Duration {
    let load = if system_load.is_finite() {
        system_load.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let crowd = 1.0 + active_profile_count as f64 / SLOT_CROWD_SIZE;
    let secs = MAX_SLOT_SECS / crowd * (1.0 - SLOT_LOAD_SHARE * load);
    Duration::from_secs_f64(secs.clamp(MIN_SLOT_SECS, MAX_SLOT_SECS))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
