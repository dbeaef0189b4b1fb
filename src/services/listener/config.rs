//! Listener configuration.

use std::time::Duration;

/// Tunables for the push-channel listener
#[derive(Clone, Debug)]
pub struct ListenerConfig {
	/// How long to wait for the transport connection
	pub connection_timeout: Duration,
	/// How long to wait for the server's correlation identifier after the
	/// transport connects
	pub handshake_timeout: Duration,
	/// Buffered events per consumer on the shared multicast stream; a
	/// consumer that falls further behind skips events
	pub multicast_capacity: usize,
}

impl Default for ListenerConfig {
	fn default() -> Self {
		Self {
			connection_timeout: Duration::from_secs(10),
			handshake_timeout: Duration::from_secs(15),
			multicast_capacity: 1024,
		}
	}
}

impl ListenerConfig {
	/// Creates a configuration with default values
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the transport connection timeout
	pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
		self.connection_timeout = connection_timeout;
		self
	}

	/// Sets the handshake timeout
	pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
		self.handshake_timeout = handshake_timeout;
		self
	}

	/// Sets the per-consumer multicast buffer capacity
	pub fn with_multicast_capacity(mut self, multicast_capacity: usize) -> Self {
		self.multicast_capacity = multicast_capacity;
		self
	}
}
