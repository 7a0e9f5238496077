//! Bayesian ranking of vote-carrying items.
//!
//! The score blends an item's observed like ratio with a prior belief:
//!
//! ```text
//! score = (likes + C * m) / (likes + dislikes + m)
//! ```
//!
//! `C` (prior weight) is the assumed like ratio of an item nobody has voted on
//! yet, `m` (prior strength) is the number of virtual votes backing that
//! belief. Items with few votes stay close to `C`; items with many votes
//! converge to their raw ratio `likes / (likes + dislikes)`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIOR_WEIGHT: f64 = 0.5;
pub const DEFAULT_PRIOR_STRENGTH: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankError {
    #[error("invalid ranking parameters: {0}")]
    InvalidParams(String),
    /// Zero prior strength combined with an item nobody voted on.
    #[error("cannot score '{name}': no votes and zero prior strength")]
    DivisionByZero { name: String },
}

/// Smoothing constants for [`bayesian_score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesianParams {
    prior_weight: f64,
    prior_strength: f64,
}

impl BayesianParams {
    pub fn new(prior_weight: f64, prior_strength: f64) -> Result<Self, RankError> {
        if !prior_weight.is_finite() || !(0.0..=1.0).contains(&prior_weight) {
            return Err(RankError::InvalidParams(format!(
                "prior_weight must be within [0, 1], got {}",
                prior_weight
            )));
        }
        if !prior_strength.is_finite() || prior_strength < 0.0 {
            return Err(RankError::InvalidParams(format!(
                "prior_strength must be >= 0, got {}",
                prior_strength
            )));
        }
        Ok(Self { prior_weight, prior_strength })
    }

    pub fn prior_weight(&self) -> f64 {
        self.prior_weight
    }

    pub fn prior_strength(&self) -> f64 {
        self.prior_strength
    }
}

impl Default for BayesianParams {
    fn default() -> Self {
        Self { prior_weight: DEFAULT_PRIOR_WEIGHT, prior_strength: DEFAULT_PRIOR_STRENGTH }
    }
}

/// Anything that carries like/dislike counts and can be ranked.
pub trait Votes {
    fn likes(&self) -> u64;
    fn dislikes(&self) -> u64;
    /// Used in error messages only.
    fn label(&self) -> String;
}

/// A caller supplied `{name, likes, dislikes}` record, as posted to `/rank`.
///
/// Any other fields the caller sends are kept in `extra` and echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub name: String,
    pub likes: u64,
    pub dislikes: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScoredItem {
    pub fn new(name: impl Into<String>, likes: u64, dislikes: u64) -> Self {
        Self { name: name.into(), likes, dislikes, extra: serde_json::Map::new() }
    }
}

impl Votes for ScoredItem {
    fn likes(&self) -> u64 {
        self.likes
    }

    fn dislikes(&self) -> u64 {
        self.dislikes
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// An item annotated with its score. Serializes as the item's own fields plus
/// `bayesian_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<T> {
    #[serde(flatten)]
    pub item: T,
    pub bayesian_score: f64,
}

/// Computes the smoothed score of a single `(likes, dislikes)` pair.
pub fn bayesian_score(likes: u64, dislikes: u64, params: &BayesianParams) -> Option<f64> {
    let likes = likes as f64;
    let total = likes + dislikes as f64;
    let denominator = total + params.prior_strength;
    if denominator == 0.0 {
        return None;
    }
    Some((likes + params.prior_weight * params.prior_strength) / denominator)
}

/// Annotates every item with its score, keeping input order.
pub fn score_all<T: Votes>(items: Vec<T>, params: &BayesianParams) -> Result<Vec<Scored<T>>, RankError> {
    items
        .into_iter()
        .map(|item| match bayesian_score(item.likes(), item.dislikes(), params) {
            Some(bayesian_score) => Ok(Scored { item, bayesian_score }),
            None => Err(RankError::DivisionByZero { name: item.label() }),
        })
        .collect()
}

/// Scores every item and sorts by score, highest first.
///
/// The sort is stable: items with equal scores keep their input order.
pub fn rank<T: Votes>(items: Vec<T>, params: &BayesianParams) -> Result<Vec<Scored<T>>, RankError> {
    let mut scored = score_all(items, params)?;
    scored.sort_by(|a, b| b.bayesian_score.partial_cmp(&a.bayesian_score).unwrap_or(Ordering::Equal));
    Ok(scored)
}
