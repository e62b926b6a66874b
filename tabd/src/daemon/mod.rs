//! The long-running side: socket lifecycle and the request loop.

pub mod server;
pub mod socket;

pub use server::DaemonServer;
pub use socket::default_socket_path;
