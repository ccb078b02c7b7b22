//! Test support for `scorewire`.
//!
//! Helpers here drive a router through a real
//! [`ConnectionPool`](scorewire::pool::ConnectionPool) over in-memory duplex
//! streams, build raw frames for malformed-input tests, and capture log
//! output and metrics for assertions.
//!
//! ```rust
//! use scorewire::{connection::Replies, message::{Message, catalog}};
//! use scorewire_testing::{decode_all, drive_router, frame_bytes};
//!
//! # async fn example() -> std::io::Result<()> {
//! let echo = || |m: Message, r: &mut Replies| { let _ = r.send(m); };
//! let login = Message::new(catalog::LOGIN).with("alice");
//! let output = drive_router(echo, vec![frame_bytes(&login)]).await?;
//! assert_eq!(decode_all(&output).len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod drive;
pub mod frames;
pub mod logging;
pub mod macros;
pub mod metrics;

pub use drive::{DEFAULT_CAPACITY, drive_router, drive_router_with_capacity, unused_listener};
pub use frames::{decode_all, frame_bytes, messages};
pub use logging::LoggerHandle;
pub use metrics::MetricsSnapshot;

/// Result type for tests that propagate errors with `?`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
