use std::cmp::Ordering;

use serde::Serialize;
use shared::{Route, ScoreWeights, ScoringMode};

use crate::error::EngineError;

/// Scores closer than this are a tie and fall through to the deterministic
/// tie-break (shorter distance, then lower id). Ties must never depend on
/// iteration order.
pub const SCORE_EPSILON: f64 = 1e-9;

/// A ranked candidate. Borrows its source route; recomputing produces a new
/// value, never mutates an old one.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRoute<'a> {
    pub route: &'a Route,
    pub score: f64,
    pub weights: ScoreWeights,
    /// 1-based position in the ranking, stable for UI selection.
    pub rank: usize,
}

impl ScoredRoute<'_> {
    pub fn distance_m(&self) -> f64 {
        self.route.total_distance_m()
    }

    pub fn total_gain_m(&self) -> f64 {
        self.route
            .metrics
            .as_ref()
            .map_or(0.0, |m| m.total_gain_m)
    }
}

/// Score and rank candidate routes, best first.
///
/// Score (lower is better):
/// `weights.distance * normalized_distance + weights.elevation * normalized_gain`,
/// each raw metric normalized by its maximum over the candidate set so that
/// meters of distance and meters of climb become comparable. A lone
/// candidate normalizes to 0 on both axes rather than dividing by zero, and
/// an axis whose maximum is 0 (every candidate flat) contributes 0.
///
/// `weights`, when given, overrides the mode preset entirely.
///
/// Every route must already carry a profile and climb metrics; the ordering
/// produced is a strict weak ordering.
pub fn rank_routes<'a>(
    routes: &'a [Route],
    mode: ScoringMode,
    weights: Option<ScoreWeights>,
) -> Result<Vec<ScoredRoute<'a>>, EngineError> {
    let weights = weights.unwrap_or_else(|| mode.preset_weights());

    for route in routes {
        if route.profile.is_none() || route.metrics.is_none() {
            return Err(EngineError::IncompleteRoute {
                route: route.id.clone(),
            });
        }
    }

    let max_distance = routes
        .iter()
        .map(Route::total_distance_m)
        .fold(0.0, f64::max);
    let max_gain = routes
        .iter()
        .map(total_gain)
        .fold(0.0, f64::max);
    let single = routes.len() == 1;

    let mut scored: Vec<ScoredRoute<'a>> = routes
        .iter()
        .map(|route| {
            let normalized_distance = if single || max_distance <= 0.0 {
                0.0
            } else {
                route.total_distance_m() / max_distance
            };
            let normalized_gain = if single || max_gain <= 0.0 {
                0.0
            } else {
                total_gain(route) / max_gain
            };
            ScoredRoute {
                route,
                score: weights.distance * normalized_distance
                    + weights.elevation * normalized_gain,
                weights,
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(rank_order);
    for (index, entry) in scored.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    if let Some(best) = scored.first() {
        tracing::debug!(
            "ranked {} candidate(s) under {:?}: best `{}` score {:.4}",
            scored.len(),
            mode,
            best.route.id,
            best.score
        );
    }
    Ok(scored)
}

fn rank_order(a: &ScoredRoute<'_>, b: &ScoredRoute<'_>) -> Ordering {
    if (a.score - b.score).abs() > SCORE_EPSILON {
        return a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal);
    }
    let (da, db) = (a.distance_m(), b.distance_m());
    if (da - db).abs() > SCORE_EPSILON {
        return da.partial_cmp(&db).unwrap_or(Ordering::Equal);
    }
    a.route.id.cmp(&b.route.id)
}

fn total_gain(route: &Route) -> f64 {
    route.metrics.as_ref().map_or(0.0, |m| m.total_gain_m)
}

/// Parameters for the three-way pick: the flattest option must stay within
/// `(1 + distance_threshold_tau)` times the shortest distance.
#[derive(Debug, Clone, Copy)]
pub struct SelectionParams {
    pub distance_threshold_tau: f64,
    pub weights: ScoreWeights,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            distance_threshold_tau: 0.15,
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteChoices<'a> {
    pub shortest: &'a Route,
    pub flattest: &'a Route,
    pub compromise: &'a Route,
}

/// Pick the three headline options from a candidate set: shortest, flattest
/// within distance reach of the shortest (unconstrained flattest when the
/// reach constraint excludes everything), and the best balanced compromise.
pub fn pick_options<'a>(
    routes: &'a [Route],
    params: &SelectionParams,
) -> Result<RouteChoices<'a>, EngineError> {
    if routes.is_empty() {
        return Err(EngineError::EmptyCandidateSet);
    }

    let ranked = rank_routes(routes, ScoringMode::Balanced, Some(params.weights))?;
    let compromise = ranked[0].route;

    let shortest = deterministic_min(routes.iter(), |r| r.total_distance_m())
        .ok_or(EngineError::EmptyCandidateSet)?;
    let reach = (1.0 + params.distance_threshold_tau) * shortest.total_distance_m();
    let within_reach: Vec<&Route> = routes
        .iter()
        .filter(|r| r.total_distance_m() <= reach)
        .collect();
    let flattest = if within_reach.is_empty() {
        tracing::warn!(
            "no candidate within {:.0}m of the shortest; picking flattest unconstrained",
            reach
        );
        deterministic_min(routes.iter(), total_gain)
    } else {
        deterministic_min(within_reach.into_iter(), |r| total_gain(r))
    }
    .ok_or(EngineError::EmptyCandidateSet)?;

    Ok(RouteChoices {
        shortest,
        flattest,
        compromise,
    })
}

/// Minimum by key with the same tie-break rules as the ranking: lower
/// distance, then lower id.
fn deterministic_min<'a>(
    routes: impl Iterator<Item = &'a Route>,
    key: impl Fn(&Route) -> f64,
) -> Option<&'a Route> {
    let mut best: Option<&Route> = None;
    for route in routes {
        best = Some(match best {
            None => route,
            Some(current) => {
                let (kr, kc) = (key(route), key(current));
                if (kr - kc).abs() > SCORE_EPSILON {
                    if kr < kc {
                        route
                    } else {
                        current
                    }
                } else {
                    let (dr, dc) = (route.total_distance_m(), current.total_distance_m());
                    if (dr - dc).abs() > SCORE_EPSILON {
                        if dr < dc {
                            route
                        } else {
                            current
                        }
                    } else if route.id < current.id {
                        route
                    } else {
                        current
                    }
                }
            }
        });
    }
    best
}
