pub mod config;
pub mod coordinator;
pub mod error;
pub mod media;
pub mod peer;
pub mod signaling_client;
pub mod webrtc_transport;

pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use signaling_client::*;
pub use webrtc_transport::*;
