use super::super::domain::WorkerCandidate;
use super::config::RulesConfig;
use super::eligibility::check_pusher;
use super::geo::calculate_distance;

pub(crate) fn is_matchable(candidate: &WorkerCandidate, config: &RulesConfig) -> bool {
    check_pusher(
        candidate.float_balance,
        candidate.is_online,
        candidate.active_deliveries,
        config,
    )
    .is_ok()
        && candidate.rating >= config.minimum_rating
}

// Single left-to-right scan; on equal distances the earlier candidate is kept.
// A candidate only replaces the best on a strictly shorter distance, so an
// unordered (NaN) distance never wins.
pub(crate) fn nearest_candidate<'a>(
    pickup_lat: f64,
    pickup_lng: f64,
    candidates: &'a [WorkerCandidate],
    config: &RulesConfig,
) -> Option<(&'a WorkerCandidate, f64)> {
    let mut best: Option<(&'a WorkerCandidate, f64)> = None;

    for candidate in candidates
        .iter()
        .filter(|candidate| is_matchable(candidate, config))
    {
        let distance = calculate_distance(pickup_lat, pickup_lng, candidate.lat, candidate.lng);
        let closer = match best {
            Some((_, best_distance)) => distance < best_distance,
            None => !distance.is_nan(),
        };
        if closer {
            best = Some((candidate, distance));
        }
    }

    best
}
