//! IPC module for daemon-UI communication

mod protocol;
mod server;

pub use protocol::{Request, Response, SessionStatus};
pub use server::Server;
