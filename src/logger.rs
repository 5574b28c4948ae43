use std::net::SocketAddr;
use std::path::Path;

/// Print the startup lines once the listener is bound, before the first
/// connection is accepted.
pub fn log_server_start(addr: &SocketAddr, root: &Path) {
    println!("Listening on: http://{addr}");
    println!("Serving static files from: {}", root.display());
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}
