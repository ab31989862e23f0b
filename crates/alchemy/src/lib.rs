//! Umbrella crate for the alchemy board.
//!
//! Re-exports the engine and protocol crates so downstream code can depend on
//! a single crate name (`alchemy`).

pub use alchemy_engine as engine;
pub use alchemy_protocol as protocol;
