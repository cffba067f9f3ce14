use crate::errors::ActorError;
use uuid::Uuid;

// Type aliases for common types
pub type ActorId = Uuid;
pub type ActorResult<T> = Result<T, ActorError>;
