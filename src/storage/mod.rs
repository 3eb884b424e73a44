//! Storage Module
//!
//! The shared keyspace and everything that lives in it: the object model,
//! the sorted-set and set containers, the sharded store, and the background
//! expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!          ▲                                 ▲
//!          │ read / update                   │ delete_expired_keys
//!  ┌───────┴────────┐              ┌─────────┴─────────┐
//!  │   Dispatcher   │              │   ExpirySweeper   │
//!  │ (per command)  │              │ (Tokio task)      │
//!  └────────────────┘              └───────────────────┘
//! ```
//!
//! ## Expiry
//!
//! - **Passive**: every read and write path treats an expired object as absent
//! - **Active**: the sweeper reclaims expired objects nobody touches again

pub mod engine;
pub mod expiry;
pub mod object;
pub mod set;
pub mod zset;

pub use engine::{Expiry, Store, StoreStats};
pub use expiry::{
    start_expiry_sweeper, ExpiryConfig, ExpirySweeper, DEFAULT_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL,
};
pub use object::{now_ms, Object, Value};
pub use set::MemberSet;
pub use zset::SortedSet;
