mod hub;
mod hub_command;
mod signal_router;
mod signaling_output;
mod signaling_service;
mod ws_handler;

pub use hub::*;
pub use hub_command::*;
pub use signal_router::*;
pub use signaling_output::*;
pub use signaling_service::*;
pub use ws_handler::*;

#[cfg(test)]
pub(crate) use signaling_output::RecordingOutput;
