//! Integration tests for the template catalog repository using
//! in-memory SurrealDB.

use flowline_core::error::FlowlineError;
use flowline_core::models::template::CreateWorkflowTemplate;
use flowline_core::repository::{Pagination, TemplateRepository};
use flowline_db::repository::SurrealTemplateRepository;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    flowline_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_get_template() {
    let db = setup().await;
    let repo = SurrealTemplateRepository::new(db);

    let structure = json!({
        "tasks": [
            { "title": "Collect documents" },
            { "title": "Sign contract" }
        ]
    });

    let template = repo
        .create(CreateWorkflowTemplate {
            name: "Employee Onboarding".into(),
            structure: structure.clone(),
            thumbnail: "https://cdn.example.com/onboarding.png".into(),
        })
        .await
        .unwrap();

    assert_eq!(template.name, "Employee Onboarding");

    // The structure body is opaque and must round-trip untouched.
    let fetched = repo.get_by_id(template.id).await.unwrap();
    assert_eq!(fetched.id, template.id);
    assert_eq!(fetched.structure, structure);
    assert_eq!(fetched.thumbnail, "https://cdn.example.com/onboarding.png");
}

#[tokio::test]
async fn get_unknown_template_is_not_found() {
    let db = setup().await;
    let repo = SurrealTemplateRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, FlowlineError::NotFound { .. }));
}

#[tokio::test]
async fn list_templates_with_pagination() {
    let db = setup().await;
    let repo = SurrealTemplateRepository::new(db);

    for i in 0..3 {
        repo.create(CreateWorkflowTemplate {
            name: format!("Template {i}"),
            structure: json!({}),
            thumbnail: String::new(),
        })
        .await
        .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.offset, 0);
    assert_eq!(page.limit, 2);

    let rest = repo
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}
