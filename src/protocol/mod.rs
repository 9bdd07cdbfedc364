//! Wire protocol definitions shared by the REST surface, the WebSocket
//! event stream, and the game engine.

pub mod error_codes;
pub mod events;
pub mod room_codes;
pub mod types;

pub use error_codes::ErrorCode;
pub use events::{ClientFrame, ServerEvent, TypingState};
pub use types::{ChatMessage, Phase, Player, PlayerId, PlayerPublic, Role, RoomStatus, Winner};
