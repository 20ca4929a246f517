//! Chat entities as persisted by the storage layer

pub mod message;
pub mod room;
pub mod user;

// Re-export for convenience
pub use message::{Message, MessageChanges, NewMessage};
pub use room::{NewRoom, Room, RoomChanges};
pub use user::{NewUser, User, UserChanges};
