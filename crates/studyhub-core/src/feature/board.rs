//! Discussion board posts, comments and likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{Entity, Immutable, Query};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPostDraft {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardPostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BoardPostPatch {
    /// Patch recording one more view of `post`.
    pub fn viewed(post: &BoardPost) -> Self {
        Self {
            view_count: Some(post.view_count + 1),
            ..Self::default()
        }
    }
}

impl Entity for BoardPost {
    const TABLE: &'static str = "board_posts";
    const ENTITY_TYPE: &'static str = "board_post";
    type Draft = BoardPostDraft;
    type Patch = BoardPostPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSort {
    #[default]
    Latest,
    /// Most viewed first
    Popular,
    /// Pinned first, then latest
    Pinned,
}

impl BoardSort {
    /// Backend ordering for this sort.
    pub fn query(&self) -> Query {
        match self {
            Self::Latest => Query::new().order_desc("created_at"),
            Self::Popular => Query::new().order_desc("view_count"),
            Self::Pinned => Query::new().order_desc("is_pinned").order_desc("created_at"),
        }
    }

    /// Same ordering applied to rows already in memory.
    pub fn sort(&self, posts: &mut [BoardPost]) {
        match self {
            Self::Latest => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Popular => posts.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
            Self::Pinned => posts.sort_by(|a, b| {
                b.is_pinned
                    .cmp(&a.is_pinned)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
    }
}

/// Posts whose title or content contains `term`, case-insensitively.
///
/// A blank term matches everything.
pub fn search_posts<'a>(posts: &'a [BoardPost], term: &str) -> Vec<&'a BoardPost> {
    let needle = term.trim().to_lowercase();
    posts
        .iter()
        .filter(|post| {
            needle.is_empty()
                || post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardCommentDraft {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

impl Entity for BoardComment {
    const TABLE: &'static str = "board_comments";
    const ENTITY_TYPE: &'static str = "board_comment";
    type Draft = BoardCommentDraft;
    type Patch = Immutable;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLikeDraft {
    pub post_id: Uuid,
    pub user_id: Uuid,
}

impl Entity for BoardLike {
    const TABLE: &'static str = "board_likes";
    const ENTITY_TYPE: &'static str = "board_like";
    type Draft = BoardLikeDraft;
    type Patch = Immutable;

    fn id(&self) -> Uuid {
        self.id
    }
}
