//! Worker suitability ranking.

use std::collections::HashMap;

use uuid::Uuid;

use civic_domain::geo::Coordinates;

use crate::domain::types::{Availability, User, WorkerLoad};

const DISTANCE_WEIGHT: f64 = 0.6;
const ACTIVE_WEIGHT: f64 = 0.3;
const BUSY_WEIGHT: f64 = 0.1;

/// Lower is better.
pub fn suitability_score(distance_km: f64, load: WorkerLoad) -> f64 {
    let busy = match load.availability() {
        Availability::Busy => 1.0,
        Availability::Free => 0.0,
    };
    DISTANCE_WEIGHT * distance_km + ACTIVE_WEIGHT * load.active as f64 + BUSY_WEIGHT * busy
}

/// Best-ranked worker for one complaint location.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub worker_id: Uuid,
    pub worker_name: String,
    pub score: f64,
}

/// Pick the lowest-score worker for `site`. Workers without home coordinates are skipped.
///
/// Ties keep the earlier worker in `workers`.
pub fn best_candidate(
    site: Coordinates,
    workers: &[User],
    loads: &HashMap<Uuid, WorkerLoad>,
) -> Option<Candidate> {
    workers
        .iter()
        .filter_map(|worker| {
            let home = worker.location?;
            let load = loads.get(&worker.id).copied().unwrap_or_default();
            Some((worker, suitability_score(home.distance_km(&site), load)))
        })
        .fold(None, |best: Option<(&User, f64)>, (worker, score)| match best {
            Some((_, best_score)) if best_score <= score => best,
            _ => Some((worker, score)),
        })
        .map(|(worker, score)| Candidate {
            worker_id: worker.id,
            worker_name: worker.name.clone(),
            score,
        })
}
