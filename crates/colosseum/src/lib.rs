//! # COLOSSEUM
//!
//! On-chain battle game coupled to a betting market: characters fight
//! deterministic turn-based battles, and third parties stake a fungible
//! asset on the outcomes through parimutuel pools and multi-leg parlay
//! tickets.
//!
//! This crate is the runtime shell over the engine crates:
//!
//! - [`colosseum_core`]: entity store, record codec, gate, signals
//! - [`colosseum_arena`]: character registry and battle state machine
//! - [`colosseum_market`]: parimutuel pools and parlay tickets
//!
//! [`Colosseum`] owns the store, the asset ledger and the entropy source,
//! and wraps every mutating entry point in
//! `pause check -> reentrancy lock -> staged transaction -> commit/abort`.
//! Signals accumulate in an outbox that external settlers and bots drain;
//! the bounded sweep operations in [`sweep`] are what those bots call.

pub mod config;
pub mod error;
pub mod runtime;
pub mod sweep;

pub use config::ColosseumConfig;
pub use error::{ColosseumError, ColosseumResult};
pub use runtime::Colosseum;
