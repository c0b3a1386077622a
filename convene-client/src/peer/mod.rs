pub mod peer_connection;
pub mod peer_link;

#[cfg(test)]
pub(crate) mod mock_connection;

pub use peer_connection::*;
pub use peer_link::*;
