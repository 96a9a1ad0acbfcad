use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity carried by a real-time change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum EntityKind {
    Pastille,
    Zone,
}

/// What happened to the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// Envelope pushed to every real-time subscriber after a committed mutation.
///
/// `payload` is the public response shape of the entity, or `{"id": ...}`
/// for deletions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEnvelope {
    pub entity_type: EntityKind,
    pub action: ChangeAction,
    pub payload: serde_json::Value,
}

impl ChangeEnvelope {
    pub fn new<T: Serialize>(
        entity_type: EntityKind,
        action: ChangeAction,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entity_type,
            action,
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Envelope for a removed entity: only the identifier survives.
    pub fn deleted(entity_type: EntityKind, id: Uuid) -> Self {
        Self {
            entity_type,
            action: ChangeAction::Deleted,
            payload: serde_json::json!({ "id": id }),
        }
    }

    /// Serialize to the text frame sent over the socket.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
