//! Assembly of threaded discussions.
//!
//! Comments are stored flat, each pointing at its parent through
//! `parent_id`. [`build_tree`] turns one topic's comments into a forest of
//! [`CommentNode`]s. It never fails: comments whose parent is not part of the
//! batch become roots, and parent cycles are cut so that every input comment
//! shows up exactly once in the output.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A comment as loaded from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: i64,
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub edited: bool,
    pub parent_id: Option<i64>,
}

/// Aggregated votes on a single comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub likes: u64,
    pub dislikes: u64,
    /// `Some(true)` liked, `Some(false)` disliked, `None` no vote.
    pub viewer_vote: Option<bool>,
}

/// Source of per-comment vote counts.
pub trait VoteLookup {
    fn tally(&self, comment_id: i64) -> VoteTally;
}

impl VoteLookup for HashMap<i64, VoteTally> {
    fn tally(&self, comment_id: i64) -> VoteTally {
        self.get(&comment_id).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: i64,
    pub author: String,
    pub text: String,
    /// Calendar date of creation, `YYYY-MM-DD`.
    pub date: String,
    pub edited: bool,
    pub likes: u64,
    pub dislikes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_vote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_author: Option<String>,
    pub replies: Vec<CommentNode>,
}

/// Builds the reply forest for a batch of comments.
///
/// Roots and replies keep the order of `comments`; pass them sorted by
/// creation time for a chronological thread. `viewer_vote` is only reported
/// when a `viewer` is given.
pub fn build_tree<V: VoteLookup + ?Sized>(
    comments: &[CommentRecord],
    votes: &V,
    viewer: Option<UserId>,
) -> Vec<CommentNode> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(comments.len());
    let mut records: Vec<&CommentRecord> = Vec::with_capacity(comments.len());
    for c in comments {
        if index.contains_key(&c.id) {
            tracing::debug!(comment_id = c.id, "duplicate comment id in batch, ignoring");
            continue;
        }
        index.insert(c.id, records.len());
        records.push(c);
    }

    let mut parents: Vec<Option<usize>> = records
        .iter()
        .map(|c| c.parent_id.and_then(|pid| index.get(&pid).copied()))
        .collect();
    for cut in break_cycles(&mut parents) {
        tracing::warn!(comment_id = records[cut].id, "comment parent cycle detected, promoting to root");
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut built: Vec<Option<CommentNode>> = records
        .iter()
        .zip(&parents)
        .map(|(c, parent)| {
            let tally = votes.tally(c.id);
            Some(CommentNode {
                id: c.id,
                author: c.author.clone(),
                text: c.text.clone(),
                date: c.created_at.format("%Y-%m-%d").to_string(),
                edited: c.edited,
                likes: tally.likes,
                dislikes: tally.dislikes,
                viewer_vote: viewer.and(tally.viewer_vote),
                parent_author: parent.map(|p| records[p].author.clone()),
                replies: Vec::new(),
            })
        })
        .collect();

    // Post-order walk: a node is finished once all of its replies are.
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&r| (r, false)).collect();
    while let Some((i, expanded)) = stack.pop() {
        if expanded {
            let replies: Vec<CommentNode> = children[i].iter().filter_map(|&c| built[c].take()).collect();
            if let Some(node) = built[i].as_mut() {
                node.replies = replies;
            }
        } else {
            stack.push((i, true));
            stack.extend(children[i].iter().rev().map(|&c| (c, false)));
        }
    }

    roots.into_iter().filter_map(|r| built[r].take()).collect()
}

/// Cuts parent links so that `parents` describes a forest.
///
/// For each cycle the member that comes first in the input loses its parent
/// and becomes a root. Returns the positions that were cut.
fn break_cycles(parents: &mut [Option<usize>]) -> Vec<usize> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parents.len()];
    let mut path = Vec::new();
    let mut cuts = Vec::new();
    for start in 0..parents.len() {
        if state[start] != UNSEEN {
            continue;
        }
        let mut cur = Some(start);
        while let Some(i) = cur {
            match state[i] {
                UNSEEN => {
                    state[i] = ON_PATH;
                    path.push(i);
                    cur = parents[i];
                }
                ON_PATH => {
                    let pos = path.iter().position(|&p| p == i).unwrap_or(0);
                    if let Some(&first) = path[pos..].iter().min() {
                        parents[first] = None;
                        cuts.push(first);
                    }
                    break;
                }
                _ => break,
            }
        }
        for i in path.drain(..) {
            state[i] = DONE;
        }
    }
    cuts
}
