//! Ephemeral-port discovery for the local forwarding listener.

use std::io;
use std::net::TcpListener;

/// Finds a free local port by binding a transient listener on port 0.
///
/// The socket is released before returning, so the port is only probably
/// free by the time the caller binds it; in practice the OS does not hand
/// the same ephemeral port out again this quickly.
pub fn free_local_port() -> io::Result<u16> {
	let listener = TcpListener::bind(("127.0.0.1", 0))?;
	let port = listener.local_addr()?.port();
	drop(listener);
	Ok(port)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_nonzero_port() {
		let port = free_local_port().unwrap();
		assert!(port > 0);
	}

	#[test]
	fn discovered_port_is_bindable() {
		let port = free_local_port().unwrap();
		TcpListener::bind(("127.0.0.1", port)).unwrap();
	}
}
