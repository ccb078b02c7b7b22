//! Property-oriented tests for round-tripping, reassembly and corruption.

mod reassembly;
mod round_trip;
mod shared;
