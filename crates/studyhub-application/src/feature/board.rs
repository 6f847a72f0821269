use std::sync::Arc;

use studyhub_core::error::Result;
use studyhub_core::feature::LikeToggle;
use studyhub_core::feature::board::{
    BoardComment, BoardCommentDraft, BoardLike, BoardLikeDraft, BoardPost, BoardPostPatch,
    BoardSort, search_posts,
};
use studyhub_core::feature::normalize_content;
use studyhub_core::repository::{EntityTable, Query};
use uuid::Uuid;

/// Board reads plus the comment and like interactions.
pub struct BoardService {
    posts: Arc<dyn EntityTable<BoardPost>>,
    comments: Arc<dyn EntityTable<BoardComment>>,
    likes: Arc<dyn EntityTable<BoardLike>>,
}

impl BoardService {
    pub fn new(
        posts: Arc<dyn EntityTable<BoardPost>>,
        comments: Arc<dyn EntityTable<BoardComment>>,
        likes: Arc<dyn EntityTable<BoardLike>>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
        }
    }

    /// Posts in `sort` order, narrowed by `term` when given.
    pub async fn posts(&self, sort: BoardSort, term: Option<&str>) -> Result<Vec<BoardPost>> {
        let mut posts = self.posts.list(&sort.query()).await?;
        if let Some(term) = term {
            posts = search_posts(&posts, term).into_iter().cloned().collect();
        }
        sort.sort(&mut posts);
        Ok(posts)
    }

    /// Loads a post and counts the view.
    pub async fn open(&self, post_id: Uuid) -> Result<BoardPost> {
        let post = self.posts.get(post_id).await?;
        self.posts.update(post_id, &BoardPostPatch::viewed(&post)).await
    }

    pub async fn comment(&self, post_id: Uuid, user_id: Uuid, content: &str) -> Result<BoardComment> {
        let draft = BoardCommentDraft {
            post_id,
            user_id,
            content: normalize_content(content)?,
        };
        self.comments.create(&draft).await
    }

    /// Likes or unlikes the post; returns whether it ends up liked.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let existing = self
            .likes
            .list(&Query::new().eq("post_id", post_id).eq("user_id", user_id))
            .await?;

        let toggle = LikeToggle::decide(existing.first().map(|like| like.id));
        match toggle {
            LikeToggle::Add => {
                self.likes.create(&BoardLikeDraft { post_id, user_id }).await?;
            }
            LikeToggle::Remove(like_id) => self.likes.delete(like_id).await?,
        }
        Ok(toggle.liked_after())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::testing::{MemoryTable, immutable};
    use chrono::Utc;
    use studyhub_core::feature::board::BoardPostDraft;

    fn make_post(_draft: &BoardPostDraft) -> BoardPost {
        unreachable!("posts are seeded")
    }

    fn patch_post(post: &mut BoardPost, patch: &BoardPostPatch) {
        if let Some(view_count) = patch.view_count {
            post.view_count = view_count;
        }
    }

    fn make_comment(draft: &BoardCommentDraft) -> BoardComment {
        BoardComment {
            id: Uuid::new_v4(),
            post_id: draft.post_id,
            user_id: draft.user_id,
            content: draft.content.clone(),
            created_at: Utc::now(),
        }
    }

    fn make_like(draft: &BoardLikeDraft) -> BoardLike {
        BoardLike {
            id: Uuid::new_v4(),
            post_id: draft.post_id,
            user_id: draft.user_id,
        }
    }

    fn post(title: &str) -> BoardPost {
        BoardPost {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            author_id: Uuid::nil(),
            is_pinned: false,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(posts: Vec<BoardPost>) -> (BoardService, Arc<MemoryTable<BoardLike>>) {
        let likes = Arc::new(MemoryTable::new(Vec::new(), make_like, immutable));
        let service = BoardService::new(
            Arc::new(MemoryTable::new(posts, make_post, patch_post)),
            Arc::new(MemoryTable::new(Vec::new(), make_comment, immutable)),
            likes.clone(),
        );
        (service, likes)
    }

    #[tokio::test]
    async fn test_like_toggles_on_and_off() {
        let post = post("Weekly recap");
        let (service, likes) = service(vec![post.clone()]);
        let user = Uuid::new_v4();

        assert!(service.toggle_like(post.id, user).await.unwrap());
        assert_eq!(likes.snapshot().len(), 1);

        assert!(!service.toggle_like(post.id, user).await.unwrap());
        assert!(likes.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_open_counts_view() {
        let post = post("Weekly recap");
        let (service, _) = service(vec![post.clone()]);

        service.open(post.id).await.unwrap();
        let reopened = service.open(post.id).await.unwrap();

        assert_eq!(reopened.view_count, 2);
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let (service, _) = service(Vec::new());
        let err = service
            .comment(Uuid::new_v4(), Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, studyhub_core::StudyhubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_narrows_posts() {
        let (service, _) = service(vec![post("GPT paper"), post("Lunch plans")]);
        let posts = service.posts(BoardSort::Latest, Some("gpt")).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "GPT paper");
    }
}
