//! # COLOSSEUM Core
//!
//! Shared substrate for the arena and the betting markets:
//!
//! - **Entity store**: typed `has/get/set/delete` over byte-keyed persistent
//!   storage, plus a staged transaction so every operation commits fully or
//!   not at all.
//! - **Record codec**: ordered, length-prefixed field encoding. Writers and
//!   readers agree on exact field order; a changed layout means a new record
//!   version, never an in-place reorder.
//! - **Key scheme**: the fixed `prefix:<id>` map of logical records to store
//!   keys.
//! - **Gate**: process-wide pause flag, reentrancy lock, role allow-lists and
//!   the typed settler capability.
//! - **Signals**: structured notifications emitted by every mutating
//!   operation, consumed by external settlers and bots.
//!
//! ## Design Principles
//!
//! 1. **One record per key** - no partially visible state between reads
//! 2. **Total aborts** - a rejected operation leaves no writes behind
//! 3. **No ambient globals** - pause/lock/roles are store records, reachable
//!    only through an explicit store handle

pub mod codec;
pub mod error;
pub mod events;
pub mod gate;
pub mod identity;
pub mod keys;
pub mod store;

pub use codec::{decode_record, DecodeError, DecodeResult, RecordReader, RecordWriter};
pub use error::{CoreResult, GateError, StoreError};
pub use events::Notification;
pub use gate::SettlerCap;
pub use identity::{Address, CallContext, Role};
pub use store::{EntityStore, MemoryStore, StoreTxn};
