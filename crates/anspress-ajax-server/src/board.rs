//! In-memory questions, answers, comments and votes.

use anspress_ajax_core::UserId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub type SharedBoard = Arc<RwLock<Board>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Question,
    Answer,
}

/// A question or an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub kind: PostKind,
    pub author: UserId,
    pub title: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub author: UserId,
    pub body: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" | "vote_up" => Some(Self::Up),
            "down" | "vote_down" => Some(Self::Down),
            _ => None,
        }
    }

    fn weight(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Vote totals for a post as seen by one voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteData {
    pub net: i64,
    /// The voter's current vote, if any.
    pub active: Option<VoteType>,
}

#[derive(Debug, Default)]
pub struct Board {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    votes: HashMap<(u64, UserId), VoteType>,
    next_post_id: u64,
    next_comment_id: u64,
}

impl Board {
    pub fn new() -> Self {
        Self {
            next_post_id: 1,
            next_comment_id: 1,
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedBoard {
        Arc::new(RwLock::new(self))
    }

    pub fn add_post(&mut self, kind: PostKind, author: UserId, title: impl Into<String>) -> u64 {
        let id = self.next_post_id;
        self.next_post_id += 1;
        self.posts.push(Post {
            id,
            kind,
            author,
            title: title.into(),
            created_at: now(),
        });
        id
    }

    pub fn post(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Caller must have checked that the post exists.
    pub fn add_comment(&mut self, post_id: u64, author: UserId, body: String) -> Comment {
        let comment = Comment {
            id: self.next_comment_id,
            post_id,
            author,
            body,
            created_at: now(),
        };
        self.next_comment_id += 1;
        self.comments.push(comment.clone());
        comment
    }

    /// Comments on a post, oldest first.
    pub fn comments(&self, post_id: u64) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect()
    }

    /// Cast `vote`. Repeating the voter's current vote retracts it; the
    /// opposite vote replaces it.
    pub fn vote(&mut self, post_id: u64, voter: UserId, vote: VoteType) -> VoteData {
        let key = (post_id, voter);
        if self.votes.get(&key) == Some(&vote) {
            self.votes.remove(&key);
        } else {
            self.votes.insert(key, vote);
        }
        self.vote_data(post_id, voter)
    }

    pub fn vote_data(&self, post_id: u64, voter: UserId) -> VoteData {
        let net = self
            .votes
            .iter()
            .filter(|((post, _), _)| *post == post_id)
            .map(|(_, v)| v.weight())
            .sum();
        VoteData {
            net,
            active: self.votes.get(&(post_id, voter)).copied(),
        }
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_toggle_and_replace() {
        let mut board = Board::new();
        let q = board.add_post(PostKind::Question, 1, "Why?");

        let data = board.vote(q, 2, VoteType::Up);
        assert_eq!(data, VoteData { net: 1, active: Some(VoteType::Up) });

        board.vote(q, 3, VoteType::Up);
        let data = board.vote(q, 2, VoteType::Down);
        assert_eq!(data, VoteData { net: 0, active: Some(VoteType::Down) });

        let data = board.vote(q, 2, VoteType::Down);
        assert_eq!(data, VoteData { net: 1, active: None });
    }

    #[test]
    fn comments_are_per_post() {
        let mut board = Board::new();
        let q = board.add_post(PostKind::Question, 1, "Why?");
        let a = board.add_post(PostKind::Answer, 2, "Because");
        board.add_comment(q, 2, "first".into());
        board.add_comment(a, 1, "second".into());
        board.add_comment(q, 3, "third".into());

        let bodies: Vec<_> = board.comments(q).into_iter().map(|c| c.body).collect();
        assert_eq!(bodies, vec!["first", "third"]);
        assert!(board.post(99).is_none());
    }
}
