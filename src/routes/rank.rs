use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    ranking::{rank, BayesianParams},
    state::AppState,
    types::{RankRequest, RankResponse},
};

/// Ranks caller supplied items. Request parameters override the server's
/// configured prior, one field at a time.
pub async fn rank_items(State(state): State<AppState>, Json(req): Json<RankRequest>) -> AppResult<Json<RankResponse>> {
    let params = BayesianParams::new(
        req.prior_weight.unwrap_or(state.ranking.prior_weight()),
        req.prior_strength.unwrap_or(state.ranking.prior_strength()),
    )?;
    let count = req.roadmaps.len();
    let mut items = req.roadmaps;
    // The computed score replaces whatever the caller sent under that name
    for item in &mut items {
        item.extra.remove("bayesian_score");
    }
    let bayesian_ranking = rank(items, &params)?;

    state.metrics.inc_rankings_computed();
    tracing::debug!(count, prior_weight = params.prior_weight(), prior_strength = params.prior_strength(), "ranked items");
    Ok(Json(RankResponse { bayesian_ranking }))
}
