use crate::datastructures::Observation;
use crate::dialect::RawRun;

/// Time of a restart log not accounted for by its restarts.
///
/// Clamped to zero, the restart times may add up to slightly more than the
/// reported total.
pub fn preprocessing_time(cpu_time: f64, restarts: &[Observation]) -> f64 {
    let restart_time: f64 = restarts.iter().map(|o| o.time).sum();
    (cpu_time - restart_time).max(0.0)
}

/// Compacts observations into the best cost and the total time.
///
/// Returns `None` for an empty slice.
pub fn compact(observations: &[Observation]) -> Option<Observation> {
    if observations.is_empty() {
        return None;
    }
    let best_cost = observations
        .iter()
        .map(|o| o.cost)
        .fold(f64::INFINITY, f64::min);
    let total_time = observations.iter().map(|o| o.time).sum();
    Some(Observation::new(best_cost, total_time))
}

/// Turns the raw records of one log into the entry stored in the tree.
///
/// Restart logs get an extra `(+inf, preprocessing time)` record so that
/// setup is charged to the run. With `compact_restarts` the records are
/// compacted into one; otherwise the restarts are kept and the setup time
/// is charged to the first of them. Returns `None` for a restart log
/// without any restart, as it has no finite cost.
pub fn reduce(
    run: RawRun,
    compact_restarts: bool,
) -> Option<Vec<Observation>> {
    match run {
        RawRun::Single(observation) => Some(vec![observation]),
        RawRun::Restarts { restarts, .. } if restarts.is_empty() => None,
        RawRun::Restarts {
            mut restarts,
            cpu_time,
        } => {
            let setup = Observation::new(
                f64::INFINITY,
                preprocessing_time(cpu_time, &restarts),
            );
            if compact_restarts {
                restarts.insert(0, setup);
                compact(&restarts).map(|best| vec![best])
            } else {
                restarts[0].time += setup.time;
                Some(restarts)
            }
        }
    }
}
