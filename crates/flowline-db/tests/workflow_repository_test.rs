//! Integration tests for the workflow aggregate, task, and access
//! repository implementations using in-memory SurrealDB.

use chrono::{TimeZone, Utc};
use flowline_core::error::FlowlineError;
use flowline_core::models::access::{CreateWorkflowAccess, Permission, UpdateWorkflowAccess};
use flowline_core::models::company::CreateCompany;
use flowline_core::models::employee::{CreateEmployee, EmployeeStatus};
use flowline_core::models::task::{TaskStatus, UpdateTask};
use flowline_core::models::template::CreateWorkflowTemplate;
use flowline_core::models::user::CreateUser;
use flowline_core::models::workflow::{
    CreateAggregateAccess, CreateAggregateTask, CreateWorkflow, CreateWorkflowAggregate,
    UpdateWorkflow,
};
use flowline_core::repository::{
    CompanyRepository, EmployeeRepository, TaskRepository, TemplateRepository, UserRepository,
    WorkflowAccessRepository, WorkflowRepository,
};
use flowline_db::repository::{
    SurrealCompanyRepository, SurrealEmployeeRepository, SurrealTaskRepository,
    SurrealTemplateRepository, SurrealUserRepository, SurrealWorkflowAccessRepository,
    SurrealWorkflowRepository,
};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    template_id: Uuid,
    creator_id: Uuid,
    e1: Uuid,
    e2: Uuid,
}

/// Spin up in-memory DB, run migrations, seed a company with three
/// employees and one template.
async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    flowline_db::run_migrations(&db).await.unwrap();

    let company = SurrealCompanyRepository::new(db.clone())
        .create(CreateCompany {
            name: "Test Co".into(),
        })
        .await
        .unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let employee_repo = SurrealEmployeeRepository::new(db.clone());
    let mut employees = Vec::new();
    for name in ["Carol", "Alice", "Bob"] {
        let user = user_repo
            .create(CreateUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
            })
            .await
            .unwrap();
        let employee = employee_repo
            .create(CreateEmployee {
                user_id: user.id,
                company_id: company.id,
                status: EmployeeStatus::Active,
                is_admin: false,
            })
            .await
            .unwrap();
        employees.push(employee.id);
    }

    let template = SurrealTemplateRepository::new(db.clone())
        .create(CreateWorkflowTemplate {
            name: "Onboarding".into(),
            structure: json!({}),
            thumbnail: String::new(),
        })
        .await
        .unwrap();

    Fixture {
        db,
        template_id: template.id,
        creator_id: employees[0],
        e1: employees[1],
        e2: employees[2],
    }
}

fn create_workflow_input(fixture: &Fixture, name: &str) -> CreateWorkflow {
    CreateWorkflow {
        template_id: fixture.template_id,
        name: name.into(),
        creator_id: fixture.creator_id,
        start_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        duration_secs: 86_400,
    }
}

fn task_descriptor(title: &str, assignee_id: Uuid) -> CreateAggregateTask {
    CreateAggregateTask {
        title: title.into(),
        description: format!("{title} description"),
        assignee_id,
        start_delta_secs: 3_600,
    }
}

// -----------------------------------------------------------------------
// Aggregate creation
// -----------------------------------------------------------------------

#[tokio::test]
async fn aggregate_create_links_the_task_chain() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());

    let (workflow, tasks, grants) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Chained"),
            tasks: vec![
                task_descriptor("first", fixture.e1),
                task_descriptor("second", fixture.e2),
                task_descriptor("third", fixture.e1),
            ],
            accessors: vec![CreateAggregateAccess {
                employee_id: fixture.e2,
                permission: Permission::ReadWrite,
            }],
        })
        .await
        .unwrap();

    assert_eq!(workflow.name, "Chained");
    assert_eq!(workflow.creator_id, fixture.creator_id);
    assert_eq!(workflow.complete_at, None);
    assert_eq!(tasks.len(), 3);

    // task[0].parent == None, task[i].parent == task[i-1].
    assert_eq!(tasks[0].parent_task_id, None);
    assert_eq!(tasks[1].parent_task_id, Some(tasks[0].id));
    assert_eq!(tasks[2].parent_task_id, Some(tasks[1].id));
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.position, i as u32);
        assert_eq!(task.workflow_id, workflow.id);
        assert_eq!(task.status, TaskStatus::Upcoming);
        assert_eq!(task.completed_at, None);
    }
    assert_eq!(tasks[0].title, "first");
    assert_eq!(tasks[2].title, "third");

    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].employee_id, fixture.e2);
    assert_eq!(grants[0].workflow_id, workflow.id);
    assert_eq!(grants[0].permission, Permission::ReadWrite);
}

#[tokio::test]
async fn aggregate_create_with_no_tasks_or_accessors() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());

    let (workflow, tasks, grants) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Bare"),
            tasks: vec![],
            accessors: vec![],
        })
        .await
        .unwrap();

    assert!(tasks.is_empty());
    assert!(grants.is_empty());

    let fetched = repo.get_by_id(workflow.id).await.unwrap();
    assert_eq!(fetched.name, "Bare");
    assert_eq!(fetched.duration_secs, 86_400);
}

#[tokio::test]
async fn list_by_workflow_preserves_chain_order() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());
    let task_repo = SurrealTaskRepository::new(fixture.db.clone());

    let (workflow, created, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Ordered"),
            tasks: vec![
                task_descriptor("a", fixture.e1),
                task_descriptor("b", fixture.e1),
                task_descriptor("c", fixture.e2),
                task_descriptor("d", fixture.e2),
            ],
            accessors: vec![],
        })
        .await
        .unwrap();

    let listed = task_repo.list_by_workflow(workflow.id).await.unwrap();
    assert_eq!(listed.len(), 4);
    for (created_task, listed_task) in created.iter().zip(listed.iter()) {
        assert_eq!(created_task.id, listed_task.id);
    }
    let titles: Vec<_> = listed.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c", "d"]);
}

// -----------------------------------------------------------------------
// Workflow update
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_workflow_fields() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());

    let (workflow, _, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Before"),
            tasks: vec![],
            accessors: vec![],
        })
        .await
        .unwrap();

    let complete_at = Utc.with_ymd_and_hms(2026, 3, 5, 17, 0, 0).unwrap();
    let updated = repo
        .update(
            workflow.id,
            UpdateWorkflow {
                name: Some("After".into()),
                complete_at: Some(Some(complete_at)),
                duration_secs: Some(7_200),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "After");
    assert_eq!(updated.complete_at, Some(complete_at));
    assert_eq!(updated.duration_secs, 7_200);
    assert_eq!(updated.start_at, workflow.start_at); // unchanged

    // Template and creator survive every update.
    assert_eq!(updated.template_id, workflow.template_id);
    assert_eq!(updated.creator_id, workflow.creator_id);

    // Clearing completion works through the double-Option.
    let cleared = repo
        .update(
            workflow.id,
            UpdateWorkflow {
                complete_at: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.complete_at, None);
}

// -----------------------------------------------------------------------
// Task update
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_task_fields() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());
    let task_repo = SurrealTaskRepository::new(fixture.db.clone());

    let (_, tasks, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "With task"),
            tasks: vec![task_descriptor("draft", fixture.e1)],
            accessors: vec![],
        })
        .await
        .unwrap();

    let updated = task_repo
        .update(
            tasks[0].id,
            UpdateTask {
                title: Some("final".into()),
                assignee_id: Some(fixture.e2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "final");
    assert_eq!(updated.assignee_id, fixture.e2);
    assert_eq!(updated.description, "draft description"); // unchanged
    assert_eq!(updated.parent_task_id, None);
    assert_eq!(updated.position, 0);
}

// -----------------------------------------------------------------------
// Access grants
// -----------------------------------------------------------------------

#[tokio::test]
async fn access_grant_is_unique_per_employee_and_workflow() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());
    let access_repo = SurrealWorkflowAccessRepository::new(fixture.db.clone());

    let (workflow, _, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Shared"),
            tasks: vec![],
            accessors: vec![],
        })
        .await
        .unwrap();

    let access = access_repo
        .create(CreateWorkflowAccess {
            workflow_id: workflow.id,
            employee_id: fixture.e1,
            permission: Permission::Read,
        })
        .await
        .unwrap();
    assert_eq!(access.permission, Permission::Read);

    let err = access_repo
        .create(CreateWorkflowAccess {
            workflow_id: workflow.id,
            employee_id: fixture.e1,
            permission: Permission::ReadWrite,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FlowlineError::AlreadyExists { .. }));

    let found = access_repo
        .get_by_workflow_and_employee(workflow.id, fixture.e1)
        .await
        .unwrap();
    assert_eq!(found.id, access.id);
    assert_eq!(found.permission, Permission::Read);
}

#[tokio::test]
async fn update_access_changes_permission_only() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());
    let access_repo = SurrealWorkflowAccessRepository::new(fixture.db.clone());

    let (workflow, _, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Escalated"),
            tasks: vec![],
            accessors: vec![],
        })
        .await
        .unwrap();

    let access = access_repo
        .create(CreateWorkflowAccess {
            workflow_id: workflow.id,
            employee_id: fixture.e2,
            permission: Permission::Read,
        })
        .await
        .unwrap();

    let updated = access_repo
        .update(
            access.id,
            UpdateWorkflowAccess {
                permission: Some(Permission::ReadWrite),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, access.id);
    assert_eq!(updated.permission, Permission::ReadWrite);
    assert_eq!(updated.workflow_id, workflow.id);
    assert_eq!(updated.employee_id, fixture.e2);
}

#[tokio::test]
async fn list_grants_by_workflow() {
    let fixture = setup().await;
    let repo = SurrealWorkflowRepository::new(fixture.db.clone());
    let access_repo = SurrealWorkflowAccessRepository::new(fixture.db.clone());

    let (workflow, _, _) = repo
        .create_aggregate(CreateWorkflowAggregate {
            workflow: create_workflow_input(&fixture, "Popular"),
            tasks: vec![],
            accessors: vec![
                CreateAggregateAccess {
                    employee_id: fixture.e1,
                    permission: Permission::Read,
                },
                CreateAggregateAccess {
                    employee_id: fixture.e2,
                    permission: Permission::ReadWrite,
                },
            ],
        })
        .await
        .unwrap();

    let grants = access_repo.list_by_workflow(workflow.id).await.unwrap();
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().any(|g| g.employee_id == fixture.e1));
    assert!(grants.iter().any(|g| g.employee_id == fixture.e2));
}
