pub mod engine;
pub mod history;
pub mod rotation;
pub mod scoring;

pub use engine::{EngineStats, OxumEngine, RotationOutcome};
pub use history::RecentViews;
pub use rotation::{RotationService, RotationState};
pub use scoring::{
    apply_repetition_penalty, calculate_fair_boost_duration, compute_composite_score,
    compute_composite_score_with, reset_repetition_penalties, sort_profiles_by_score,
};
