//! Logging utilities.
//!
//! Sets up `tracing` output for applications embedding the SDK. The SDK
//! itself only emits events; installing a subscriber is the host's choice.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Installs a compact stdout subscriber filtered by `RUST_LOG` (default
/// `info`).
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
	setup_logging_with_writer(std::io::stdout)
}

/// Installs a compact subscriber writing to the given writer.
pub fn setup_logging_with_writer<W>(
	writer: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>
where
	W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(writer)
				.event_format(fmt::format().with_level(true).with_target(true).compact()),
		)
		.try_init()?;
	Ok(())
}
