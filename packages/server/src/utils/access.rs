use uuid::Uuid;

use crate::error::AppError;

/// Who is performing a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated mobile user.
    User(Uuid),
    /// A back-office caller holding the shared API key.
    Admin,
}

/// Returns `Ok(())` if the actor owns the resource or is an admin, `Err(Forbidden)` otherwise.
pub fn ensure_owner(actor: Actor, owner_id: Uuid) -> Result<(), AppError> {
    match actor {
        Actor::Admin => Ok(()),
        Actor::User(id) if id == owner_id => Ok(()),
        Actor::User(_) => Err(AppError::Forbidden),
    }
}
