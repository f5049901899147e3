//! The boost rotation engine.
//!
//! Owns the set of actively boosted profiles and the recently-viewed history.
//! All mutation goes through `&mut self`, so a single owner (or a mutex
//! around the engine) is the only writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use oxum_config::{ConfigError, EngineConfig, EngineConfigPatch};
use oxum_core::{Clock, ProfileScoreData, ProfileStatus, QueueFilters};

use crate::history::RecentViews;
use crate::scoring::{
    calculate_fair_boost_duration, compute_composite_score_with, penalty_multiplier, rank_order,
    sort_profiles_by_score_with, waited_past_threshold,
};

const SECS_PER_HOUR: f64 = 3_600.0;

/// Result of one rotation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationOutcome {
    /// 1-based count of rotations performed by this engine.
    pub rotation: u64,
    /// Profile that took the top slot, if any profile is active.
    pub top_profile: Option<String>,
    /// The top slot was forced to a profile waiting past `max_wait_hours`.
    pub overdue: bool,
    /// Number of profiles whose repetition penalty was cleared in this pass.
    pub penalties_cleared: usize,
    pub active_profiles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub active_profiles: usize,
    pub penalized_profiles: usize,
    pub recently_viewed: usize,
    pub rotations: u64,
    pub current_top: Option<String>,
}

pub struct OxumEngine {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    active: HashMap<String, ProfileScoreData>,
    recently_viewed: RecentViews,
    rotations: u64,
    system_load: f64,
    current_top: Option<String>,
}

impl OxumEngine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::build(EngineConfig::default(), clock)
    }

    fn build(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            recently_viewed: RecentViews::new(config.history_capacity),
            system_load: config.assumed_system_load,
            config: Arc::new(config),
            clock,
            active: HashMap::new(),
            rotations: 0,
            current_top: None,
        }
    }

    // ── Queue ─────────────────────────────────────────────────────────────────

    /// Bring every active profile's waiting time up to date, apply repetition
    /// penalties from the view history, and return the ranked queue.
    ///
    /// The waiting-time update is written back to the stored records.
    pub fn get_boost_queue(&mut self, filters: Option<&QueueFilters>) -> Vec<ProfileScoreData> {
        let now = self.clock.now();
        self.refresh_elapsed(now);
        self.apply_penalties();

        let snapshot: Vec<ProfileScoreData> = self.active.values().cloned().collect();
        let queue = sort_profiles_by_score_with(&snapshot, filters, self.config.rotation_factor);
        debug!(
            active = self.active.len(),
            returned = queue.len(),
            filtered = filters.is_some_and(|f| !f.is_empty()),
            "built boost queue"
        );
        queue
    }

    pub fn record_profile_view(&mut self, profile_id: &str) {
        let newly_recorded = self.recently_viewed.push(profile_id);
        let now = self.clock.now();
        let active = match self.active.get_mut(profile_id) {
            Some(profile) => {
                profile.time_since_last_top = 0.0;
                profile.last_calculated = now;
                true
            }
            None => false,
        };
        debug!(profile_id, newly_recorded, active, "recorded profile view");
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Insert or replace the entry for `profile.profile_id`.  Returns the
    /// replaced entry, if any.
    pub fn activate_boost(&mut self, mut profile: ProfileScoreData) -> Option<ProfileScoreData> {
        if !(profile.time_since_last_top >= 0.0) {
            profile.time_since_last_top = 0.0;
        }
        if !(profile.repetition_penalty > 0.0 && profile.repetition_penalty <= 1.0) {
            profile.repetition_penalty = 1.0;
        }
        let profile_id = profile.profile_id.clone();
        let previous = self.active.insert(profile_id.clone(), profile);
        debug!(%profile_id, replaced = previous.is_some(), "boost activated");
        previous
    }

    /// Returns `false` when the profile was not active.
    pub fn deactivate_boost(&mut self, profile_id: &str) -> bool {
        let removed = self.active.remove(profile_id).is_some();
        if removed && self.current_top.as_deref() == Some(profile_id) {
            self.current_top = None;
        }
        debug!(profile_id, removed, "boost deactivated");
        removed
    }

    pub fn status(&self, profile_id: &str) -> ProfileStatus {
        if self.active.contains_key(profile_id) {
            ProfileStatus::Active
        } else {
            ProfileStatus::Inactive
        }
    }

    pub fn profile(&self, profile_id: &str) -> Option<&ProfileScoreData> {
        self.active.get(profile_id)
    }

    // ── Rotation ──────────────────────────────────────────────────────────────

    /// One rotation pass: update waiting times, clear stale penalties every
    /// `penalty_reset_every` passes, then hand the top slot to the longest
    /// waiting profile past `max_wait_hours`, or else to the best ranked one.
    /// The winner's waiting time restarts at zero.
    pub fn perform_rotation(&mut self) -> RotationOutcome {
        let now = self.clock.now();
        self.refresh_elapsed(now);
        self.apply_penalties();
        self.rotations += 1;

        let penalties_cleared = if self.rotations % self.config.penalty_reset_every == 0 {
            self.reset_penalties()
        } else {
            0
        };

        let overdue_profile = self.longest_overdue();
        let overdue = overdue_profile.is_some();
        let top_profile = overdue_profile.or_else(|| self.best_ranked());

        if let Some(id) = &top_profile {
            if let Some(profile) = self.active.get_mut(id) {
                profile.time_since_last_top = 0.0;
            }
        }
        self.current_top = top_profile.clone();

        let outcome = RotationOutcome {
            rotation: self.rotations,
            top_profile,
            overdue,
            penalties_cleared,
            active_profiles: self.active.len(),
        };
        info!(
            rotation = outcome.rotation,
            top = ?outcome.top_profile,
            overdue,
            penalties_cleared,
            active = outcome.active_profiles,
            "boost rotation complete"
        );
        outcome
    }

    /// Clear the penalty of every active profile that has waited longer than
    /// `reset_threshold_hours`, and drop it from the view history so the
    /// penalty is not re-applied.  Returns the number of profiles cleared.
    pub fn reset_penalties(&mut self) -> usize {
        let threshold = self.config.reset_threshold_hours;
        let mut cleared = 0;
        for profile in self.active.values_mut() {
            if !waited_past_threshold(profile, threshold) {
                continue;
            }
            let in_history = self.recently_viewed.remove(&profile.profile_id);
            if profile.is_penalized() || in_history {
                profile.repetition_penalty = 1.0;
                cleared += 1;
            }
        }
        if cleared > 0 {
            debug!(cleared, threshold, "repetition penalties reset");
        }
        cleared
    }

    // ── Tuning ────────────────────────────────────────────────────────────────

    pub fn calculate_optimal_boost_duration(&self) -> Duration {
        calculate_fair_boost_duration(self.active.len(), self.system_load)
    }

    /// Replace the load figure used by [`Self::calculate_optimal_boost_duration`].
    pub fn set_system_load(&mut self, load: f64) {
        self.system_load = if load.is_finite() { load.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Merge `patch` into a new config and swap it in.  Nothing changes when
    /// the merged config is invalid.  A running rotation timer is not restarted.
    pub fn update_config(&mut self, patch: EngineConfigPatch) -> Result<(), ConfigError> {
        let next = self.config.merged(&patch);
        next.validate()?;
        info!(
            rotation_factor = next.rotation_factor,
            repetition_penalty_factor = next.repetition_penalty_factor,
            reset_threshold_hours = next.reset_threshold_hours,
            "engine config updated"
        );
        self.config = Arc::new(next);
        Ok(())
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        Arc::clone(&self.config)
    }

    pub(crate) fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.config.rotation_interval_secs)
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    pub fn recently_viewed(&self) -> &RecentViews {
        &self.recently_viewed
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            active_profiles: self.active.len(),
            penalized_profiles: self.active.values().filter(|p| p.is_penalized()).count(),
            recently_viewed: self.recently_viewed.len(),
            rotations: self.rotations,
            current_top: self.current_top.clone(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Waiting time accrues in whole seconds.  The sub-second remainder stays
    /// behind `last_calculated` and is counted on a later refresh.
    fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        for profile in self.active.values_mut() {
            // A clock that steps backwards adds nothing and keeps the later mark.
            let elapsed_secs = (now - profile.last_calculated).num_seconds();
            if elapsed_secs > 0 {
                profile.time_since_last_top += elapsed_secs as f64 / SECS_PER_HOUR;
                profile.last_calculated += chrono::Duration::seconds(elapsed_secs);
            }
        }
    }

    fn longest_overdue(&self) -> Option<String> {
        let limit = self.config.max_wait_hours;
        self.active
            .values()
            .filter(|p| p.time_since_last_top >= limit)
            .min_by(|l, r| {
                r.time_since_last_top
                    .total_cmp(&l.time_since_last_top)
                    .then_with(|| l.profile_id.cmp(&r.profile_id))
            })
            .map(|p| p.profile_id.clone())
    }

    fn best_ranked(&self) -> Option<String> {
        let rotation_factor = self.config.rotation_factor;
        self.active
            .values()
            .map(|p| (compute_composite_score_with(p, rotation_factor), p))
            .min_by(|(ls, lp), (rs, rp)| rank_order(*ls, &lp.profile_id, *rs, &rp.profile_id))
            .map(|(_, p)| p.profile_id.clone())
    }

    fn apply_penalties(&mut self) {
        let multiplier = penalty_multiplier(self.config.repetition_penalty_factor);
        for profile in self.active.values_mut() {
            if self.recently_viewed.contains(&profile.profile_id) {
                profile.repetition_penalty = multiplier;
            }
        }
    }
}
