//! Reader comments and their moderation.

use std::sync::Arc;

use crate::domain::{
    Actor, Comment, CommentAuthor, CommentDraft, CommentId, CommentStatus, NewComment, Page,
    PageRequest, PostId,
};
use crate::error::{DomainError, RepoError, ValidationErrors};
use crate::ports::{Action, CapabilityChecker, Clock, CommentQuery, CommentRepository};

use super::lifecycle::PostLifecycleManager;
use super::validation;

pub const MODERATION_PAGE_SIZE: u64 = 15;
const MAX_CONTENT: usize = 2000;
const MAX_NAME: usize = 255;

pub struct CommentService {
    lifecycle: Arc<PostLifecycleManager>,
    comments: Arc<dyn CommentRepository>,
    capabilities: Arc<dyn CapabilityChecker>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(
        lifecycle: Arc<PostLifecycleManager>,
        comments: Arc<dyn CommentRepository>,
        capabilities: Arc<dyn CapabilityChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lifecycle,
            comments,
            capabilities,
            clock,
        }
    }

    /// Leave a comment on a post. New comments wait for moderation.
    pub async fn submit(
        &self,
        post_id: PostId,
        draft: CommentDraft,
        viewer: Option<&Actor>,
    ) -> Result<Comment, DomainError> {
        let post = self.lifecycle.get(post_id).await?;
        if !self.lifecycle.is_publicly_visible(&post, viewer) {
            return Err(DomainError::not_found("post", post_id));
        }

        let mut errors = ValidationErrors::new();
        if validation::required(&mut errors, "content", &draft.content, "Comment content is required.")
            && draft.content.chars().count() > MAX_CONTENT
        {
            errors.add("content", "Comment cannot exceed 2000 characters.");
        }

        let author = match viewer {
            Some(actor) => Some(CommentAuthor::User {
                user_id: actor.user_id,
            }),
            None => guest_author(&mut errors, draft.author_name, draft.author_email),
        };

        if let Some(parent_id) = draft.parent_id {
            match self.comments.find_by_id(parent_id).await? {
                None => errors.add("parent_id", "Parent comment does not exist."),
                Some(parent) if parent.post_id != post.id => {
                    errors.add("parent_id", "Parent comment belongs to another post.")
                }
                Some(parent) if parent.is_reply() => {
                    errors.add("parent_id", "Replies can only be one level deep.")
                }
                Some(_) => {}
            }
        }

        errors.into_result()?;
        let Some(author) = author else {
            return Err(DomainError::Validation(ValidationErrors::single(
                "author_name",
                "Your name is required.",
            )));
        };

        let comment = self
            .comments
            .insert(NewComment {
                post_id: post.id,
                author,
                content: draft.content.trim().to_string(),
                status: CommentStatus::Pending,
                parent_id: draft.parent_id,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment submitted for moderation");
        Ok(comment)
    }

    pub async fn get(&self, actor: &Actor, id: CommentId) -> Result<Comment, DomainError> {
        self.authorize(actor)?;
        self.find(id).await
    }

    /// Moderation listing, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        query: CommentQuery,
        page: u64,
    ) -> Result<Page<Comment>, DomainError> {
        self.authorize(actor)?;
        let query = CommentQuery {
            search: validation::non_blank(query.search),
            ..query
        };
        Ok(self
            .comments
            .list(&query, PageRequest::new(page, MODERATION_PAGE_SIZE))
            .await?)
    }

    pub async fn moderate(
        &self,
        actor: &Actor,
        id: CommentId,
        status: CommentStatus,
    ) -> Result<Comment, DomainError> {
        self.authorize(actor)?;
        let comment = self.find(id).await?;
        let previous = comment.status;

        let comment = self
            .comments
            .update(Comment {
                status,
                updated_at: self.clock.now(),
                ..comment
            })
            .await
            .map_err(|e| not_found(e, id))?;

        tracing::info!(comment_id = %id, from = %previous, to = %status, "Comment moderated");
        Ok(comment)
    }

    /// Delete a comment and its replies.
    pub async fn delete(&self, actor: &Actor, id: CommentId) -> Result<(), DomainError> {
        self.authorize(actor)?;
        self.comments.delete(id).await.map_err(|e| not_found(e, id))?;
        tracing::info!(comment_id = %id, "Comment deleted");
        Ok(())
    }

    async fn find(&self, id: CommentId) -> Result<Comment, DomainError> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))
    }

    fn authorize(&self, actor: &Actor) -> Result<(), DomainError> {
        if self.capabilities.can(actor, Action::ModerateComments) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

fn guest_author(
    errors: &mut ValidationErrors,
    name: Option<String>,
    email: Option<String>,
) -> Option<CommentAuthor> {
    let name = validation::non_blank(name);
    let email = validation::non_blank(email);

    match &name {
        None => errors.add("author_name", "Your name is required."),
        Some(name) if name.chars().count() > MAX_NAME => {
            validation::max_chars(errors, "author_name", name, MAX_NAME)
        }
        Some(_) => {}
    }
    match &email {
        None => errors.add("author_email", "Your email is required."),
        Some(email) => {
            validation::email(errors, "author_email", email);
            validation::max_chars(errors, "author_email", email, MAX_NAME);
        }
    }

    Some(CommentAuthor::Guest {
        name: name?,
        email: email?,
    })
}

fn not_found(err: RepoError, id: CommentId) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("comment", id),
        other => other.into(),
    }
}
