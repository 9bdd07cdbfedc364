//! Rooms: the broadcast hub, the room object itself, and the process-wide
//! registry that owns every room's lifecycle.

pub mod hub;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod room;

pub use hub::{ConnectionId, RoomHub};
pub use registry::{JoinResult, LeaveAction, RoomInfo, RoomRegistry, RoomSummary};
pub use room::{GameSettings, Room};
