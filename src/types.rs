use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ranking::{Scored, ScoredItem, Votes};

pub type UserId = i64;

// ---------------------- accounts ----------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

// ---------------------- catalog ----------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDto {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    /// Sum over the topic's roadmaps.
    pub likes: u64,
    pub dislikes: u64,
}

impl Votes for TopicDto {
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

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopicRequest {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
}

// ---------------------- roadmaps ----------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapDto {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: UserId,
    pub author: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub likes: u64,
    pub dislikes: u64,
}

impl Votes for RoadmapDto {
    fn likes(&self) -> u64 {
        self.likes
    }

    fn dislikes(&self) -> u64 {
        self.dislikes
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapDetail {
    #[serde(flatten)]
    pub roadmap: Scored<RoadmapDto>,
    pub steps: Vec<StepDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoadmapRequest {
    pub topic_id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDto {
    pub id: i64,
    pub roadmap_id: i64,
    pub parent_step_id: Option<i64>,
    pub step_title: String,
    pub step_description: Option<String>,
    pub step_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStepRequest {
    pub parent_step_id: Option<i64>,
    pub step_title: String,
    pub step_description: Option<String>,
    #[serde(default)]
    pub step_order: i64,
}

// ---------------------- votes & ranking ----------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Like,
    Dislike,
    None,
}

impl VoteValue {
    /// Stored representation; `None` means "remove my vote".
    pub fn as_db(self) -> Option<i64> {
        match self {
            VoteValue::Like => Some(1),
            VoteValue::Dislike => Some(-1),
            VoteValue::None => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    pub vote: VoteValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSummary {
    pub likes: u64,
    pub dislikes: u64,
    pub viewer_vote: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub roadmaps: Vec<ScoredItem>,
    pub prior_weight: Option<f64>,
    pub prior_strength: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub bayesian_ranking: Vec<Scored<ScoredItem>>,
}

// ---------------------- comments ----------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub topic_id: i64,
    pub content: String,
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDto {
    pub id: i64,
    pub topic_id: i64,
    pub user_id: UserId,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
}
