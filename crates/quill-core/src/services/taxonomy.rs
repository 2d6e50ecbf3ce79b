//! Category and tag maintenance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    Actor, Category, CategoryId, Counted, LabelDraft, NewLabel, Tag, TagId, slugify,
};
use crate::error::{DomainError, RepoError, ValidationErrors};
use crate::ports::{
    Action, CapabilityChecker, CategoryRepository, Clock, PostRepository, TagRepository,
};

use super::validation;

const MAX_NAME: usize = 255;
const DEFAULT_COLOR: &str = "#6b7280";

pub struct TaxonomyService {
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    posts: Arc<dyn PostRepository>,
    capabilities: Arc<dyn CapabilityChecker>,
    clock: Arc<dyn Clock>,
}

impl TaxonomyService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
        posts: Arc<dyn PostRepository>,
        capabilities: Arc<dyn CapabilityChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            categories,
            tags,
            posts,
            capabilities,
            clock,
        }
    }

    /// Every category with its count of live posts.
    pub async fn categories(&self) -> Result<Vec<Counted<Category>>, DomainError> {
        let counts = self.posts.live_counts_by_category(self.clock.now()).await?;
        Ok(with_category_counts(self.categories.all().await?, &counts))
    }

    /// Every tag with its count of live posts.
    pub async fn tags(&self) -> Result<Vec<Counted<Tag>>, DomainError> {
        let counts = self.posts.live_counts_by_tag(self.clock.now()).await?;
        Ok(with_tag_counts(self.tags.all().await?, &counts))
    }

    pub async fn create_category(
        &self,
        actor: &Actor,
        draft: LabelDraft,
    ) -> Result<Category, DomainError> {
        self.authorize(actor)?;
        let (label, mut errors) = check_label(draft, self.clock.now());
        if !label.slug.is_empty() && self.categories.slug_exists(&label.slug, None).await? {
            errors.add("slug", "This slug is already taken.");
        }
        errors.into_result()?;

        let category = self.categories.insert(label).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: CategoryId,
        draft: LabelDraft,
    ) -> Result<Category, DomainError> {
        self.authorize(actor)?;
        let existing = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))?;

        let (label, mut errors) = check_label(draft, self.clock.now());
        if !label.slug.is_empty() && self.categories.slug_exists(&label.slug, Some(id)).await? {
            errors.add("slug", "This slug is already taken.");
        }
        errors.into_result()?;

        let category = self
            .categories
            .update(Category {
                name: label.name,
                slug: label.slug,
                description: label.description,
                color: label.color,
                updated_at: label.created_at,
                ..existing
            })
            .await
            .map_err(|e| not_found(e, "category", id))?;
        tracing::info!(category_id = %id, "Category updated");
        Ok(category)
    }

    /// Delete a category. Its posts become uncategorized.
    pub async fn delete_category(&self, actor: &Actor, id: CategoryId) -> Result<(), DomainError> {
        self.authorize(actor)?;
        self.categories
            .delete(id)
            .await
            .map_err(|e| not_found(e, "category", id))?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    pub async fn create_tag(&self, actor: &Actor, draft: LabelDraft) -> Result<Tag, DomainError> {
        self.authorize(actor)?;
        let (label, mut errors) = check_label(draft, self.clock.now());
        if !label.slug.is_empty() && self.tags.slug_exists(&label.slug, None).await? {
            errors.add("slug", "This slug is already taken.");
        }
        errors.into_result()?;

        let tag = self.tags.insert(label).await?;
        tracing::info!(tag_id = %tag.id, slug = %tag.slug, "Tag created");
        Ok(tag)
    }

    pub async fn update_tag(
        &self,
        actor: &Actor,
        id: TagId,
        draft: LabelDraft,
    ) -> Result<Tag, DomainError> {
        self.authorize(actor)?;
        let existing = self
            .tags
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("tag", id))?;

        let (label, mut errors) = check_label(draft, self.clock.now());
        if !label.slug.is_empty() && self.tags.slug_exists(&label.slug, Some(id)).await? {
            errors.add("slug", "This slug is already taken.");
        }
        errors.into_result()?;

        let tag = self
            .tags
            .update(Tag {
                name: label.name,
                slug: label.slug,
                color: label.color,
                updated_at: label.created_at,
                ..existing
            })
            .await
            .map_err(|e| not_found(e, "tag", id))?;
        tracing::info!(tag_id = %id, "Tag updated");
        Ok(tag)
    }

    /// Delete a tag and detach it from every post.
    pub async fn delete_tag(&self, actor: &Actor, id: TagId) -> Result<(), DomainError> {
        self.authorize(actor)?;
        self.tags
            .delete(id)
            .await
            .map_err(|e| not_found(e, "tag", id))?;
        tracing::info!(tag_id = %id, "Tag deleted");
        Ok(())
    }

    fn authorize(&self, actor: &Actor) -> Result<(), DomainError> {
        if self.capabilities.can(actor, Action::ManageTaxonomy) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

fn check_label(draft: LabelDraft, now: DateTime<Utc>) -> (NewLabel, ValidationErrors) {
    let mut errors = ValidationErrors::new();
    let name = draft.name.trim().to_string();

    if validation::required(&mut errors, "name", &name, "Name is required.") {
        validation::max_chars(&mut errors, "name", &name, MAX_NAME);
    }

    let slug = slugify(draft.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
        errors.add("slug", "Slug is required.");
    }

    let color = validation::non_blank(draft.color).unwrap_or_else(|| DEFAULT_COLOR.to_string());
    validation::hex_color(&mut errors, "color", &color);

    let label = NewLabel {
        name,
        slug,
        description: validation::non_blank(draft.description),
        color,
        created_at: now,
    };
    (label, errors)
}

pub(crate) fn with_category_counts(
    categories: Vec<Category>,
    counts: &HashMap<CategoryId, u64>,
) -> Vec<Counted<Category>> {
    categories
        .into_iter()
        .map(|item| Counted {
            posts_count: counts.get(&item.id).copied().unwrap_or(0),
            item,
        })
        .collect()
}

pub(crate) fn with_tag_counts(tags: Vec<Tag>, counts: &HashMap<TagId, u64>) -> Vec<Counted<Tag>> {
    tags.into_iter()
        .map(|item| Counted {
            posts_count: counts.get(&item.id).copied().unwrap_or(0),
            item,
        })
        .collect()
}

fn not_found(err: RepoError, entity_type: &'static str, id: impl std::fmt::Display) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(entity_type, id),
        other => other.into(),
    }
}
