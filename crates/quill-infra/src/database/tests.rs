#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Value};
    use uuid::Uuid;

    use crate::database::entity::sea_orm_active_enums::PostStatusColumn;
    use crate::database::entity::{category, post, post_tag};
    use crate::database::postgres_base::map_db_err;
    use crate::database::postgres_repo::{
        PostgresCategoryRepository, PostgresPostRepository, mask_email,
    };
    use quill_core::domain::{
        Category, CategoryId, NewPost, PageRequest, PostId, PostStatus, TagId,
    };
    use quill_core::error::RepoError;
    use quill_core::ports::{BaseRepository, PostQuery, PostRepository, RelatedTo};

    fn post_model(id: i64) -> post::Model {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        post::Model {
            id,
            title: "Hello".to_owned(),
            slug: "hello".to_owned(),
            excerpt: None,
            content: "Body".to_owned(),
            featured_image: None,
            status: PostStatusColumn::Published,
            meta_data: None,
            published_at: Some(at.into()),
            scheduled_at: None,
            author_id: Uuid::nil(),
            category_id: Some(3),
            version: 1,
            parent_id: None,
            views_count: 7,
            created_at: at.into(),
            updated_at: at.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_slug_loads_tags() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post_model(1)]])
            .append_query_results(vec![vec![
                post_tag::Model {
                    post_id: 1,
                    tag_id: 4,
                },
                post_tag::Model {
                    post_id: 1,
                    tag_id: 2,
                },
            ]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let post = repo.find_by_slug("hello").await.unwrap().unwrap();

        assert_eq!(post.id, PostId(1));
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.category_id, Some(CategoryId(3)));
        assert_eq!(post.views_count, 7);
        assert_eq!(
            post.tag_ids.into_iter().collect::<Vec<_>>(),
            vec![TagId(2), TagId(4)]
        );
    }

    #[tokio::test]
    async fn test_find_missing_post_skips_tag_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<post::Model>::new()])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        assert!(repo.find_by_id(PostId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_post_writes_tag_links() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post::Model {
                views_count: 0,
                ..post_model(5)
            }]])
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let post = repo
            .insert(NewPost {
                title: "Hello".to_owned(),
                slug: "hello".to_owned(),
                excerpt: None,
                content: "Body".to_owned(),
                featured_image: None,
                status: PostStatus::Published,
                meta: None,
                published_at: Some(at),
                scheduled_at: None,
                author_id: Uuid::nil(),
                category_id: Some(CategoryId(3)),
                tag_ids: BTreeSet::from([TagId(8)]),
                version: 1,
                parent_id: None,
                created_at: at,
            })
            .await
            .unwrap();

        assert_eq!(post.id, PostId(5));
        assert_eq!(post.views_count, 0);
        assert!(post.tag_ids.contains(&TagId(8)));
    }

    #[tokio::test]
    async fn test_slug_exists_counts_matches() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(1)),
            )])]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        assert!(repo.slug_exists("hello", Some(PostId(2))).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo.delete(PostId(42)).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_increment_views_on_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo.increment_views(PostId(42)).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_related_to_nothing_returns_empty_page() {
        // No results are queued: touching the database would fail the test.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostgresPostRepository::new(db);

        let query = PostQuery {
            related: Some(RelatedTo {
                category_id: None,
                tag_ids: Vec::new(),
            }),
            ..PostQuery::default()
        };
        let page = repo.list(&query, PageRequest::new(1, 3)).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_find_category_by_id() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![category::Model {
                id: 3,
                name: "Rust".to_owned(),
                slug: "rust".to_owned(),
                description: None,
                color: "#6b7280".to_owned(),
                created_at: now.into(),
                updated_at: now.into(),
            }]])
            .into_connection();

        let repo = PostgresCategoryRepository::new(db);

        let result: Option<Category> = repo.find_by_id(CategoryId(3)).await.unwrap();

        let category = result.unwrap();
        assert_eq!(category.slug, "rust");
        assert_eq!(category.id, CategoryId(3));
    }

    #[test]
    fn test_map_db_err() {
        assert!(matches!(
            map_db_err(DbErr::RecordNotUpdated),
            RepoError::NotFound
        ));
        assert!(matches!(
            map_db_err(DbErr::Custom(
                "duplicate key value violates unique constraint".to_owned()
            )),
            RepoError::Constraint(_)
        ));
        assert!(matches!(
            map_db_err(DbErr::Conn(RuntimeErr::Internal("refused".to_owned()))),
            RepoError::Connection(_)
        ));
        assert!(matches!(
            map_db_err(DbErr::Custom("syntax error".to_owned())),
            RepoError::Query(_)
        ));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("j@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
