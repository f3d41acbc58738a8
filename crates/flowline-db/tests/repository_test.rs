//! Integration tests for User, Company, and Employee repository
//! implementations using in-memory SurrealDB.

use flowline_core::error::FlowlineError;
use flowline_core::models::company::{CompanyStatus, CreateCompany, UpdateCompany};
use flowline_core::models::employee::{CreateEmployee, EmployeeStatus, UpdateEmployee};
use flowline_core::models::user::CreateUser;
use flowline_core::repository::{CompanyRepository, EmployeeRepository, UserRepository};
use flowline_db::repository::{
    SurrealCompanyRepository, SurrealEmployeeRepository, SurrealUserRepository,
};
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

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(CreateUser {
            name: "Alice".into(),
            email: "alice@example.com".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Alice");
    assert_eq!(user.email, "alice@example.com");

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.email, user.email);
}

#[tokio::test]
async fn get_unknown_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, FlowlineError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Company tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_company_starts_active() {
    let db = setup().await;
    let repo = SurrealCompanyRepository::new(db);

    let company = repo
        .create(CreateCompany {
            name: "ACME Corp".into(),
        })
        .await
        .unwrap();

    assert_eq!(company.name, "ACME Corp");
    assert_eq!(company.status, CompanyStatus::Active);

    let fetched = repo.get_by_id(company.id).await.unwrap();
    assert_eq!(fetched.id, company.id);
}

#[tokio::test]
async fn update_company_status() {
    let db = setup().await;
    let repo = SurrealCompanyRepository::new(db);

    let company = repo
        .create(CreateCompany {
            name: "Winding Down Ltd".into(),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            company.id,
            UpdateCompany {
                status: Some(CompanyStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, company.id);
    assert_eq!(updated.status, CompanyStatus::Inactive);
    assert_eq!(updated.name, "Winding Down Ltd"); // unchanged
}

// -----------------------------------------------------------------------
// Employee tests
// -----------------------------------------------------------------------

async fn seed_company_and_user(
    db: &Surreal<surrealdb::engine::local::Db>,
) -> (Uuid, Uuid) {
    let company = SurrealCompanyRepository::new(db.clone())
        .create(CreateCompany {
            name: "Test Co".into(),
        })
        .await
        .unwrap();
    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            name: "Bob".into(),
            email: "bob@example.com".into(),
        })
        .await
        .unwrap();
    (company.id, user.id)
}

#[tokio::test]
async fn create_and_get_employee() {
    let db = setup().await;
    let (company_id, user_id) = seed_company_and_user(&db).await;
    let repo = SurrealEmployeeRepository::new(db);

    let employee = repo
        .create(CreateEmployee {
            user_id,
            company_id,
            status: EmployeeStatus::Invited,
            is_admin: false,
        })
        .await
        .unwrap();

    assert_eq!(employee.user_id, user_id);
    assert_eq!(employee.company_id, company_id);
    assert_eq!(employee.status, EmployeeStatus::Invited);
    assert!(!employee.is_admin);

    let fetched = repo.get_by_id(employee.id).await.unwrap();
    assert_eq!(fetched.id, employee.id);

    let by_pair = repo
        .get_by_user_and_company(user_id, company_id)
        .await
        .unwrap();
    assert_eq!(by_pair.id, employee.id);
}

#[tokio::test]
async fn duplicate_membership_is_rejected() {
    let db = setup().await;
    let (company_id, user_id) = seed_company_and_user(&db).await;
    let repo = SurrealEmployeeRepository::new(db);

    repo.create(CreateEmployee {
        user_id,
        company_id,
        status: EmployeeStatus::Active,
        is_admin: false,
    })
    .await
    .unwrap();

    let err = repo
        .create(CreateEmployee {
            user_id,
            company_id,
            status: EmployeeStatus::Invited,
            is_admin: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FlowlineError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_employee_status_and_admin_flag() {
    let db = setup().await;
    let (company_id, user_id) = seed_company_and_user(&db).await;
    let repo = SurrealEmployeeRepository::new(db);

    let employee = repo
        .create(CreateEmployee {
            user_id,
            company_id,
            status: EmployeeStatus::Invited,
            is_admin: false,
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            employee.id,
            UpdateEmployee {
                status: Some(EmployeeStatus::Active),
                is_admin: Some(true),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, EmployeeStatus::Active);
    assert!(updated.is_admin);
}

#[tokio::test]
async fn list_for_user_spans_companies() {
    let db = setup().await;
    let (company_id, user_id) = seed_company_and_user(&db).await;
    let second_company = SurrealCompanyRepository::new(db.clone())
        .create(CreateCompany {
            name: "Second Co".into(),
        })
        .await
        .unwrap();
    let repo = SurrealEmployeeRepository::new(db);

    repo.create(CreateEmployee {
        user_id,
        company_id,
        status: EmployeeStatus::Inactive,
        is_admin: false,
    })
    .await
    .unwrap();
    repo.create(CreateEmployee {
        user_id,
        company_id: second_company.id,
        status: EmployeeStatus::Active,
        is_admin: true,
    })
    .await
    .unwrap();

    let memberships = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(memberships.len(), 2);
    assert!(memberships.iter().any(|m| m.company_id == company_id));
    assert!(
        memberships
            .iter()
            .any(|m| m.company_id == second_company.id && m.is_admin)
    );
}
