use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::entities::audit_log;

/// Best-effort operational audit trail. Recording never fails the calling
/// operation: errors are logged and swallowed. Callers invoke it after their
/// transaction commits.
#[derive(Clone)]
pub struct AuditService {
    db: Arc<DatabaseConnection>,
}

impl AuditService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records one audit entry. Infallible by contract.
    pub async fn record(
        &self,
        actor: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        details: Option<serde_json::Value>,
    ) {
        let row = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id),
            details: Set(details.map(|d| d.to_string())),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = row.insert(&*self.db).await {
            warn!(error = %e, action, entity_type, "failed to write audit entry");
        }
    }
}
