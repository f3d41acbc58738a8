//! Workflow template domain model.
//!
//! Templates are an immutable catalog: created by administrative
//! tooling, listed/retrieved by company admins, and referenced (never
//! owned) by workflows. The structure body is an opaque JSON document;
//! this core stores and returns it without interpretation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: Uuid,
    /// Display name shown in the template picker.
    pub name: String,
    /// Opaque structured template body.
    pub structure: serde_json::Value,
    /// Thumbnail image URL.
    pub thumbnail: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new template (administrative tooling only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowTemplate {
    pub name: String,
    pub structure: serde_json::Value,
    pub thumbnail: String,
}
