pub use convene_core::{ParticipantId, RoomId, SessionId};

pub mod model {
    pub use convene_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use convene_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use convene_client::*;
}
