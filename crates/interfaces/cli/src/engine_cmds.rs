//! `simulate` and `run`: drive the boost engine from the command line.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::info;

use oxum_config::OxumConfig;
use oxum_core::{Clock, ManualClock, ProfileScoreData, QueueFilters, SystemClock};
use oxum_engine::{OxumEngine, RotationService, compute_composite_score_with};

const REGIONS: &[&str] = &["EU", "US", "APAC"];
const LANGUAGES: &[&str] = &["en", "de", "es"];

pub(crate) struct SimulateArgs {
    pub profiles: usize,
    pub rotations: u32,
    pub views: usize,
    pub region: Option<String>,
    pub language: Option<String>,
}

pub(crate) fn simulate(config: &OxumConfig, args: SimulateArgs) -> Result<()> {
    for step in simulation_steps(config, &args)? {
        println!("{}", serde_json::to_string(&step)?);
    }
    Ok(())
}

/// One JSON report per rotation: the outcome plus the filtered queue.
fn simulation_steps(config: &OxumConfig, args: &SimulateArgs) -> Result<Vec<Value>> {
    let clock = ManualClock::new(Utc::now());
    let mut engine = OxumEngine::new(config.engine.clone(), Arc::new(clock.clone()))?;
    for profile in synthetic_profiles(args.profiles, clock.now()) {
        engine.activate_boost(profile);
    }

    let filters = QueueFilters {
        region: args.region.clone(),
        language: args.language.clone(),
    };
    let step = Duration::seconds(config.engine.rotation_interval_secs as i64);
    let rotation_factor = config.engine.rotation_factor;

    let mut steps = Vec::with_capacity(args.rotations as usize);
    for _ in 0..args.rotations {
        clock.advance(step);
        let outcome = engine.perform_rotation();
        let queue = engine.get_boost_queue(Some(&filters));
        for viewed in queue.iter().take(args.views) {
            engine.record_profile_view(&viewed.profile_id);
        }

        let ranked: Vec<Value> = queue
            .iter()
            .map(|p| {
                json!({
                    "profileId": p.profile_id,
                    "score": compute_composite_score_with(p, rotation_factor),
                    "hoursWaiting": p.time_since_last_top,
                    "penalized": p.is_penalized(),
                })
            })
            .collect();
        steps.push(json!({
            "outcome": outcome,
            "slotSeconds": engine.calculate_optimal_boost_duration().as_secs_f64(),
            "queue": ranked,
        }));
    }
    Ok(steps)
}

/// Deterministic spread of scores, credits, regions and languages.
fn synthetic_profiles(count: usize, now: DateTime<Utc>) -> Vec<ProfileScoreData> {
    (0..count)
        .map(|i| {
            ProfileScoreData::new(
                format!("profile-{i:03}"),
                10.0 + ((i * 37) % 50) as f64,
                ((i * 13) % 20) as f64,
                now,
            )
            .with_region(REGIONS[i % REGIONS.len()])
            .with_language(LANGUAGES[(i / REGIONS.len()) % LANGUAGES.len()])
        })
        .collect()
}

pub(crate) async fn run(config: &OxumConfig, profiles_file: Option<&Path>) -> Result<()> {
    let mut engine = OxumEngine::new(config.engine.clone(), Arc::new(SystemClock))?;
    if let Some(path) = profiles_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read profiles file {}", path.display()))?;
        let profiles: Vec<ProfileScoreData> =
            serde_json::from_str(&raw).context("parse profiles file")?;
        for profile in profiles {
            engine.activate_boost(profile);
        }
    }
    info!(
        active = engine.stats().active_profiles,
        interval_secs = config.engine.rotation_interval_secs,
        "starting boost rotation"
    );

    let mut service = RotationService::new(Arc::new(Mutex::new(engine)));
    let mut outcomes = service.subscribe();
    service.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = outcomes.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = (*outcomes.borrow_and_update()).clone();
                if let Some(outcome) = latest {
                    println!("{}", serde_json::to_string(&outcome)?);
                }
            }
        }
    }

    service.stop().await;
    Ok(())
}
