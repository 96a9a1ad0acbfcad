use std::sync::Arc;

use common::storage::StorageGateway;
use common::{ChangeAction, ChangeEnvelope, EntityKind};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hub::ConnectionHub;
use crate::error::AppError;
use crate::services::{pastille, zone};

/// Pushes the committed state of an entity to every real-time subscriber.
///
/// Publishing never fails from the caller's point of view: anything that
/// goes wrong is logged and dropped.
#[derive(Clone)]
pub struct Broadcaster {
    db: DatabaseConnection,
    storage: StorageGateway,
    hub: Arc<ConnectionHub>,
}

impl Broadcaster {
    pub fn new(db: DatabaseConnection, storage: StorageGateway, hub: Arc<ConnectionHub>) -> Self {
        Self { db, storage, hub }
    }

    /// Publish in a detached task so the caller neither waits for the
    /// re-read nor cancels delivery by going away.
    pub fn notify(&self, kind: EntityKind, id: Uuid, action: ChangeAction) {
        let broadcaster = self.clone();
        tokio::spawn(async move { broadcaster.publish(kind, id, action).await });
    }

    pub async fn publish(&self, kind: EntityKind, id: Uuid, action: ChangeAction) {
        let envelope = match action {
            ChangeAction::Deleted => ChangeEnvelope::deleted(kind, id),
            ChangeAction::Created | ChangeAction::Updated => {
                match self.snapshot(kind, id, action).await {
                    Ok(Some(envelope)) => envelope,
                    Ok(None) => {
                        info!(?kind, %id, "Entity vanished before broadcast, skipping");
                        return;
                    }
                    Err(e) => {
                        warn!(?kind, %id, error = ?e, "Could not load entity for broadcast");
                        return;
                    }
                }
            }
        };

        let text = match envelope.to_text() {
            Ok(text) => text,
            Err(e) => {
                warn!(?kind, %id, error = %e, "Could not serialize change envelope");
                return;
            }
        };

        let report = self.hub.broadcast(&text);
        debug!(
            ?kind,
            ?action,
            %id,
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast change"
        );
    }

    async fn snapshot(
        &self,
        kind: EntityKind,
        id: Uuid,
        action: ChangeAction,
    ) -> Result<Option<ChangeEnvelope>, AppError> {
        let envelope = match kind {
            EntityKind::Pastille => pastille::load_view(&self.db, &self.storage, id)
                .await?
                .map(|view| ChangeEnvelope::new(kind, action, &view)),
            EntityKind::Zone => zone::load_view(&self.db, id)
                .await?
                .map(|view| ChangeEnvelope::new(kind, action, &view)),
        };
        envelope
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
