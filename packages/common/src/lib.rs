pub mod event;
pub mod storage;

pub use event::{ChangeAction, ChangeEnvelope, EntityKind};
