//! Trend/news feed posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{Entity, Immutable, Query};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPostDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendPostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Entity for TrendPost {
    const TABLE: &'static str = "trend_posts";
    const ENTITY_TYPE: &'static str = "trend_post";
    type Draft = TrendPostDraft;
    type Patch = TrendPostPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Category filter value that matches every post.
pub const ALL_CATEGORIES: &str = "all";

/// Backend query for the feed, newest first.
pub fn feed_query(category: &str) -> Query {
    let query = Query::new();
    let query = if category == ALL_CATEGORIES {
        query
    } else {
        query.eq("category", category)
    };
    query.order_desc("created_at")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCommentDraft {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

impl Entity for TrendComment {
    const TABLE: &'static str = "trend_comments";
    const ENTITY_TYPE: &'static str = "trend_comment";
    type Draft = TrendCommentDraft;
    type Patch = Immutable;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLikeDraft {
    pub post_id: Uuid,
    pub user_id: Uuid,
}

impl Entity for TrendLike {
    const TABLE: &'static str = "trend_likes";
    const ENTITY_TYPE: &'static str = "trend_like";
    type Draft = TrendLikeDraft;
    type Patch = Immutable;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// A post with the counts the feed displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    pub post: TrendPost,
    pub like_count: usize,
    pub comment_count: usize,
}

impl TrendEntry {
    pub fn from_rows(post: TrendPost, likes: &[TrendLike], comments: &[TrendComment]) -> Self {
        Self {
            like_count: likes.iter().filter(|l| l.post_id == post.id).count(),
            comment_count: comments.iter().filter(|c| c.post_id == post.id).count(),
            post,
        }
    }
}

/// Most liked first; ties keep the newer post first.
pub fn sort_by_popularity(entries: &mut [TrendEntry]) {
    entries.sort_by(|a, b| {
        b.like_count
            .cmp(&a.like_count)
            .then_with(|| b.post.created_at.cmp(&a.post.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(title: &str, age_hours: i64) -> TrendPost {
        TrendPost {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            category: "llm".to_string(),
            url: None,
            thumbnail_url: None,
            tags: Vec::new(),
            created_by: None,
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    fn like(post_id: Uuid) -> TrendLike {
        TrendLike {
            id: Uuid::new_v4(),
            post_id,
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_feed_query_category_filter() {
        assert!(feed_query(ALL_CATEGORIES).filters.is_empty());
        let query = feed_query("llm");
        assert_eq!(query.filters[0].column, "category");
        assert_eq!(query.filters[0].value, "llm");
    }

    #[test]
    fn test_popularity_sort() {
        let older = post("older", 5);
        let newer = post("newer", 1);
        let liked = post("liked", 10);
        let likes = vec![like(liked.id), like(liked.id), like(older.id), like(newer.id)];

        let mut entries: Vec<TrendEntry> = [older, newer, liked]
            .into_iter()
            .map(|p| TrendEntry::from_rows(p, &likes, &[]))
            .collect();
        sort_by_popularity(&mut entries);

        let titles: Vec<&str> = entries.iter().map(|e| e.post.title.as_str()).collect();
        assert_eq!(titles, vec!["liked", "newer", "older"]);
        assert_eq!(entries[0].like_count, 2);
    }
}
