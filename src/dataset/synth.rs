//! Seeded generator for labeled workplace profiles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::record::{Level, OsPreference, Record, Role};

/// Default seed used by the generator tool.
pub const DEFAULT_SEED: u64 = 42;

/// Label threshold applied to [`heuristic_score`].
pub const SCORE_THRESHOLD: f64 = 0.5;

const DESIGN_TOOLS_RATE: f64 = 0.10;
const OFFICE_APPS_RATE: f64 = 0.60;
const WINDOWS_ONLY_SUPPORT_RATE: f64 = 0.30;
const WINDOWS_ONLY_RATE: f64 = 0.12;

/// Produces synthetic records from a seeded RNG.
///
/// Draws happen in a fixed order per record, so the same seed and count
/// always yield the same records.
pub struct SampleSynthesizer {
    rng: StdRng,
}

impl SampleSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` labeled records, continuing from the current RNG state.
    pub fn generate(&mut self, count: usize) -> Vec<Record> {
        (0..count).map(|_| self.next_record()).collect()
    }

    fn next_record(&mut self) -> Record {
        let rng = &mut self.rng;
        let role = pick(rng, Role::ALL);
        let uses_design_tools = role == Role::Designer || rng.random_bool(DESIGN_TOOLS_RATE);
        let uses_office_apps = matches!(role, Role::Management | Role::Marketing | Role::Support)
            || rng.random_bool(OFFICE_APPS_RATE);
        let windows_rate = if role == Role::Support {
            WINDOWS_ONLY_SUPPORT_RATE
        } else {
            WINDOWS_ONLY_RATE
        };
        let requires_windows_only_apps = rng.random_bool(windows_rate);
        let mobility = pick(rng, Level::ALL);
        let security_sensitivity = pick(rng, Level::ALL);
        let budget_sensitivity = pick(rng, Level::ALL);
        let preferred_os = pick(rng, OsPreference::ALL);

        let mut record = Record {
            role,
            uses_design_tools,
            uses_office_apps,
            requires_windows_only_apps,
            mobility,
            security_sensitivity,
            budget_sensitivity,
            preferred_os,
            recommend_mac: None,
        };
        record.recommend_mac = Some(heuristic_label(&record));
        record
    }
}

/// Convenience wrapper: a fresh generator seeded with `seed`.
pub fn generate(seed: u64, count: usize) -> Vec<Record> {
    SampleSynthesizer::new(seed).generate(count)
}

/// Linear score behind the ground-truth label.
pub fn heuristic_score(record: &Record) -> f64 {
    let mut score = 0.0;
    if record.uses_design_tools {
        score += 2.0;
    }
    if record.requires_windows_only_apps {
        score -= 3.0;
    }
    if record.preferred_os == OsPreference::Mac {
        score += 2.0;
    }
    if record.mobility == Level::High {
        score += 1.0;
    }
    if record.security_sensitivity == Level::High {
        score += 0.5;
    }
    if record.budget_sensitivity == Level::Low {
        score -= 1.0;
    }
    score
}

/// `true` when the score clears [`SCORE_THRESHOLD`].
pub fn heuristic_label(record: &Record) -> bool {
    heuristic_score(record) > SCORE_THRESHOLD
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}
