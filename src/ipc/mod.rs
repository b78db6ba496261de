//! IPC module for framework-daemon communication

mod protocol;
mod server;

pub use protocol::{ModuleStatus, Notification, Request, Response};
pub use server::Server;
