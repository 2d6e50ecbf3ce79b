//! PostgreSQL repository implementations.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbConn, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use quill_core::domain::{
    Category, CategoryId, Comment, NewComment, NewLabel, NewPost, Page, PageRequest,
    Post, PostId, Tag, TagId, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CategoryRepository, CommentQuery, CommentRepository, PostOrder, PostQuery,
    PostRepository, TagRepository, UserRepository,
};

use super::entity::sea_orm_active_enums::{CommentStatusColumn, PostStatusColumn};
use super::entity::{category, comment, post, post_tag, tag, user};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<tag::Entity>;

/// PostgreSQL post repository.
///
/// Posts carry their tag ids, which live in the `post_tag` table, so this one
/// does not go through the generic base.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn tag_links(&self, post_ids: &[i64]) -> Result<HashMap<i64, BTreeSet<TagId>>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = post_tag::Entity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let mut by_post: HashMap<i64, BTreeSet<TagId>> = HashMap::new();
        for link in links {
            by_post
                .entry(link.post_id)
                .or_default()
                .insert(TagId(link.tag_id));
        }
        Ok(by_post)
    }

    async fn hydrate(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let mut tags = self.tag_links(&ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let tag_ids = tags.remove(&model.id).unwrap_or_default();
                model.into_domain(tag_ids)
            })
            .collect())
    }

    async fn hydrate_one(&self, model: Option<post::Model>) -> Result<Option<Post>, RepoError> {
        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn replace_tags(
    txn: &DatabaseTransaction,
    post_id: i64,
    tag_ids: &BTreeSet<TagId>,
) -> Result<(), RepoError> {
    post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(post_id))
        .exec(txn)
        .await
        .map_err(map_db_err)?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    post_tag::Entity::insert_many(tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag_id.0),
    }))
    .exec_without_returning(txn)
    .await
    .map_err(map_db_err)?;

    Ok(())
}

/// Case-insensitive substring match on a text column.
fn lower_like<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
        .like(format!("%{}%", term.to_lowercase()))
}

/// Ids of posts carrying any of `tag_ids`.
fn tagged_with(tag_ids: &[TagId]) -> SelectStatement {
    Query::select()
        .column(post_tag::Column::PostId)
        .from(post_tag::Entity)
        .and_where(post_tag::Column::TagId.is_in(tag_ids.iter().map(|t| t.0)))
        .to_owned()
}

fn live_at(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(post::Column::Status.eq(PostStatusColumn::Published))
        .add(post::Column::PublishedAt.lte(now))
}

fn post_condition(query: &PostQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(status) = query.status {
        condition = condition.add(post::Column::Status.eq(PostStatusColumn::from(status)));
    }
    if let Some(author_id) = query.author_id {
        condition = condition.add(post::Column::AuthorId.eq(author_id));
    }
    if let Some(term) = &query.search {
        condition = condition.add(
            Condition::any()
                .add(lower_like(post::Column::Title, term))
                .add(lower_like(post::Column::Excerpt, term))
                .add(lower_like(post::Column::Content, term)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(post::Column::CategoryId.eq(category_id.0));
    }
    if let Some(tag_id) = query.tag_id {
        condition = condition.add(post::Column::Id.in_subquery(tagged_with(&[tag_id])));
    }
    if let Some(now) = query.live_at {
        condition = condition.add(live_at(now));
    }
    if query.with_featured_image {
        condition = condition.add(post::Column::FeaturedImage.is_not_null());
    }
    if let Some(id) = query.exclude {
        condition = condition.add(post::Column::Id.ne(id.0));
    }
    if let Some(related) = &query.related {
        let mut any = Condition::any();
        if let Some(category_id) = related.category_id {
            any = any.add(post::Column::CategoryId.eq(category_id.0));
        }
        if !related.tag_ids.is_empty() {
            any = any.add(post::Column::Id.in_subquery(tagged_with(&related.tag_ids)));
        }
        condition = condition.add(any);
    }

    condition
}

fn ordered(select: Select<post::Entity>, order: PostOrder) -> Select<post::Entity> {
    match order {
        PostOrder::Newest => select.order_by_desc(post::Column::CreatedAt),
        PostOrder::RecentlyPublished => select.order_by_desc(post::Column::PublishedAt),
    }
    .order_by_desc(post::Column::Id)
}

#[async_trait]
impl BaseRepository<Post, PostId> for PostgresPostRepository {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let model = post::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate_one(model).await
    }

    async fn update(&self, entity: Post) -> Result<Post, RepoError> {
        let tag_ids = entity.tag_ids.clone();

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let model = post::ActiveModel::from(entity)
            .update(&txn)
            .await
            .map_err(map_db_err)?;
        replace_tags(&txn, model.id, &tag_ids).await?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(model.into_domain(tag_ids))
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let result = post::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(post_id = %id, "Post row deleted, versions and comments cascade");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, post: NewPost) -> Result<Post, RepoError> {
        let tag_ids = post.tag_ids.clone();

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let model = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        replace_tags(&txn, model.id, &tag_ids).await?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(model.into_domain(tag_ids))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let model = post::Entity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate_one(model).await
    }

    async fn slug_exists(&self, slug: &str, except: Option<PostId>) -> Result<bool, RepoError> {
        let mut select = post::Entity::find().filter(post::Column::Slug.eq(slug));
        if let Some(id) = except {
            select = select.filter(post::Column::Id.ne(id.0));
        }

        Ok(select.count(&self.db).await.map_err(map_db_err)? > 0)
    }

    async fn versions_of(&self, parent: PostId) -> Result<Vec<Post>, RepoError> {
        let models = post::Entity::find()
            .filter(post::Column::ParentId.eq(parent.0))
            .order_by_asc(post::Column::Version)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate(models).await
    }

    async fn increment_views(&self, id: PostId) -> Result<(), RepoError> {
        let result = post::Entity::update_many()
            .col_expr(
                post::Column::ViewsCount,
                Expr::col(post::Column::ViewsCount).add(1),
            )
            .filter(post::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>, RepoError> {
        // "related to nothing" matches nothing
        if query
            .related
            .as_ref()
            .is_some_and(|r| r.category_id.is_none() && r.tag_ids.is_empty())
        {
            return Ok(page.slice(Vec::<Post>::new()));
        }

        let select = post::Entity::find().filter(post_condition(query));
        let total = select.clone().count(&self.db).await.map_err(map_db_err)?;
        let models = ordered(select, query.order)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: self.hydrate(models).await?,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn live_counts_by_category(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HashMap<CategoryId, u64>, RepoError> {
        let rows: Vec<(i64, i64)> = post::Entity::find()
            .select_only()
            .column(post::Column::CategoryId)
            .column_as(Expr::col((post::Entity, post::Column::Id)).count(), "posts_count")
            .filter(live_at(now))
            .filter(post::Column::CategoryId.is_not_null())
            .group_by(post::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (CategoryId(id), count.max(0) as u64))
            .collect())
    }

    async fn live_counts_by_tag(&self, now: DateTime<Utc>) -> Result<HashMap<TagId, u64>, RepoError> {
        let rows: Vec<(i64, i64)> = post_tag::Entity::find()
            .select_only()
            .column(post_tag::Column::TagId)
            .column_as(
                Expr::col((post_tag::Entity, post_tag::Column::PostId)).count(),
                "posts_count",
            )
            .inner_join(post::Entity)
            .filter(live_at(now))
            .group_by(post_tag::Column::TagId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (TagId(id), count.max(0) as u64))
            .collect())
    }
}

fn comment_condition(query: &CommentQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(post_id) = query.post_id {
        condition = condition.add(comment::Column::PostId.eq(post_id.0));
    }
    if let Some(status) = query.status {
        condition = condition.add(comment::Column::Status.eq(CommentStatusColumn::from(status)));
    }
    if let Some(term) = &query.search {
        condition = condition.add(lower_like(comment::Column::Content, term));
    }
    condition
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(comment)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_all(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError> {
        let models = comment::Entity::find()
            .filter(comment_condition(query))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list(
        &self,
        query: &CommentQuery,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let select = comment::Entity::find().filter(comment_condition(query));
        let total = select.clone().count(&self.db).await.map_err(map_db_err)?;
        let models = select
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn insert(&self, category: NewLabel) -> Result<Category, RepoError> {
        let model = category::ActiveModel::from(category)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn slug_exists(
        &self,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepoError> {
        let mut select = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = except {
            select = select.filter(category::Column::Id.ne(id.0));
        }

        Ok(select.count(&self.db).await.map_err(map_db_err)? > 0)
    }

    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn insert(&self, tag: NewLabel) -> Result<Tag, RepoError> {
        let model = tag::ActiveModel::from(tag)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = tag::Entity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn slug_exists(&self, slug: &str, except: Option<TagId>) -> Result<bool, RepoError> {
        let mut select = tag::Entity::find().filter(tag::Column::Slug.eq(slug));
        if let Some(id) = except {
            select = select.filter(tag::Column::Id.ne(id.0));
        }

        Ok(select.count(&self.db).await.map_err(map_db_err)? > 0)
    }

    async fn find_by_ids(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn all(&self) -> Result<Vec<Tag>, RepoError> {
        let models = tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// Mask an email address so it can be logged without exposing PII.
pub(crate) fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        tracing::debug!(user_email = %mask_email(&user.email), "Inserting user");

        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}
