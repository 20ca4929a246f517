//! Storage collaborators for chat entities
//!
//! Each entity has an async storage trait with a PostgreSQL implementation.
//! [`MemoryStore`] implements all three traits in process.

pub mod memory;
pub mod message;
pub mod room;
pub mod user;

pub use memory::MemoryStore;
pub use message::{MessageStore, PgMessageRepository};
pub use room::{PgRoomRepository, RoomStore};
pub use user::{PgUserRepository, UserStore};
