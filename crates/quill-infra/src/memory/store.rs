//! In-memory storage - used when no database is configured, and in tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryId, Comment, CommentAuthor, CommentId, NewComment, NewLabel, NewPost, Page,
    PageRequest, Post, PostId, Tag, TagId, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CategoryRepository, CommentQuery, CommentRepository, PostQuery,
    PostRepository, TagRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    categories: BTreeMap<CategoryId, Category>,
    tags: BTreeMap<TagId, Tag>,
    users: HashMap<Uuid, User>,
    last_post: i64,
    last_comment: i64,
    last_category: i64,
    last_tag: i64,
}

impl Tables {
    fn slug_taken(&self, slug: &str, except: Option<PostId>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    /// `root` plus every post whose parent chain leads back to it.
    fn lineage(&self, root: PostId) -> BTreeSet<PostId> {
        let mut found = BTreeSet::from([root]);
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for post in self.posts.values() {
                if post.parent_id == Some(parent) && found.insert(post.id) {
                    frontier.push(post.id);
                }
            }
        }
        found
    }
}

/// Every repository port backed by one set of in-process tables.
///
/// Each table is keyed by its ordinal id; rows refer to each other by id only.
/// Note: Data is lost on process restart.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&post.slug, Some(post.id)) {
            return Err(RepoError::Constraint(format!("duplicate slug {}", post.slug)));
        }
        let stored = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        // The counter only moves through increment_views.
        let views_count = stored.views_count;
        *stored = Post { views_count, ..post };
        Ok(stored.clone())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }

        let doomed = tables.lineage(id);
        tables.posts.retain(|post_id, _| !doomed.contains(post_id));
        tables
            .comments
            .retain(|_, comment| !doomed.contains(&comment.post_id));

        tracing::debug!(post_id = %id, removed = doomed.len(), "Deleted post lineage");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&post.slug, None) {
            return Err(RepoError::Constraint(format!("duplicate slug {}", post.slug)));
        }
        if let Some(parent) = post.parent_id {
            if !tables.posts.contains_key(&parent) {
                return Err(RepoError::Constraint(format!("unknown parent post {parent}")));
            }
        }

        tables.last_post += 1;
        let id = PostId(tables.last_post);
        let post = Post::from_new(id, post);
        tables.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str, except: Option<PostId>) -> Result<bool, RepoError> {
        Ok(self.tables.read().await.slug_taken(slug, except))
    }

    async fn versions_of(&self, parent: PostId) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut versions: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.parent_id == Some(parent))
            .cloned()
            .collect();
        versions.sort_by_key(|p| (p.version, p.id));
        Ok(versions)
    }

    async fn increment_views(&self, id: PostId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.views_count += 1;
        Ok(())
    }

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        query.sort(&mut posts);
        Ok(page.slice(posts))
    }

    async fn live_counts_by_category(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HashMap<CategoryId, u64>, RepoError> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for post in tables.posts.values().filter(|p| p.is_live_at(now)) {
            if let Some(category) = post.category_id {
                *counts.entry(category).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn live_counts_by_tag(&self, now: DateTime<Utc>) -> Result<HashMap<TagId, u64>, RepoError> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for post in tables.posts.values().filter(|p| p.is_live_at(now)) {
            for tag in &post.tag_ids {
                *counts.entry(*tag).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl BaseRepository<Comment, CommentId> for InMemoryStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .comments
            .get_mut(&comment.id)
            .ok_or(RepoError::NotFound)?;
        *stored = comment;
        Ok(stored.clone())
    }

    async fn delete(&self, id: CommentId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|_, c| c.parent_id != Some(id));
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "unknown post {}",
                comment.post_id
            )));
        }

        tables.last_comment += 1;
        let id = CommentId(tables.last_comment);
        let comment = Comment::from_new(id, comment);
        tables.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn find_all(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn list(
        &self,
        query: &CommentQuery,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        Ok(page.slice(self.find_all(query).await?))
    }
}

#[async_trait]
impl BaseRepository<Category, CategoryId> for InMemoryStore {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .categories
            .get_mut(&category.id)
            .ok_or(RepoError::NotFound)?;
        *stored = category;
        Ok(stored.clone())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn insert(&self, category: NewLabel) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        tables.last_category += 1;
        let id = CategoryId(tables.last_category);
        let category = Category::from_new(id, category);
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn slug_exists(
        &self,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != except))
    }

    async fn all(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Tag, TagId> for InMemoryStore {
    async fn find_by_id(&self, id: TagId) -> Result<Option<Tag>, RepoError> {
        Ok(self.tables.read().await.tags.get(&id).cloned())
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        let stored = tables.tags.get_mut(&tag.id).ok_or(RepoError::NotFound)?;
        *stored = tag;
        Ok(stored.clone())
    }

    async fn delete(&self, id: TagId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tags.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            post.tag_ids.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn insert(&self, tag: NewLabel) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        tables.last_tag += 1;
        let id = TagId(tables.last_tag);
        let tag = Tag::from_new(id, tag);
        tables.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str, except: Option<TagId>) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tags
            .values()
            .any(|t| t.slug == slug && Some(t.id) != except))
    }

    async fn find_by_ids(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| tables.tags.get(id).cloned())
            .collect())
    }

    async fn all(&self) -> Result<Vec<Tag>, RepoError> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        let stored = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *stored = user;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let owned: Vec<PostId> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            let doomed = tables.lineage(post_id);
            tables.posts.retain(|pid, _| !doomed.contains(pid));
            tables.comments.retain(|_, c| !doomed.contains(&c.post_id));
        }

        let written: BTreeSet<CommentId> = tables
            .comments
            .values()
            .filter(|c| matches!(c.author, CommentAuthor::User { user_id } if user_id == id))
            .map(|c| c.id)
            .collect();
        tables.comments.retain(|cid, c| {
            !written.contains(cid) && !c.parent_id.is_some_and(|p| written.contains(&p))
        });
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}
