use uuid::Uuid;

// Core entities
pub mod agents;
pub mod chat_messages;
pub mod meetings;

// Status/enum types
pub mod agent_status;
pub mod chat_role;
pub mod meeting_status;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
