mod participant;
mod room;
mod room_registry;

pub use participant::*;
pub use room::*;
pub use room_registry::*;
