#![doc(html_root_url = "https://docs.rs/scorewire/latest")]
//! Public API for the `scorewire` library.
//!
//! This crate implements the packet protocol of a tournament-prediction
//! service: a marker-delimited wire codec with typed values, per-connection
//! actors, a connection pool serving requests on blocking workers, response
//! chunking for large collections, and a TCP server and client.

pub mod byte_order;
pub mod chunker;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod database;
pub mod message;
pub mod metrics;
pub mod panic;
pub mod pool;
pub mod router;
pub mod server;
pub mod value;

pub use chunker::{ChunkSizes, ChunkSpec, ResponseChunker};
pub use client::{Client, ClientError};
pub use codec::{CodecConfig, CorruptionError, DecodeOutcome, Decoded, PacketCodec};
pub use config::Config;
pub use connection::{CloseReason, ConnectionId, Replies, SocketError};
pub use message::{Message, MessageId};
pub use metrics::{CONNECTIONS_ACTIVE, Direction, ERRORS_TOTAL, FRAMES_CORRUPTED, FRAMES_PROCESSED};
pub use pool::{ConnectionPool, PoolConfig, PoolEvent};
pub use router::{Router, TournamentRouter};
pub use server::{Server, ServerError};
pub use value::{Row, Value};
