//! shard-ring: shard-routing consensus plugin for OCR3.
//!
//! Every round, each oracle observes its local view of shard health and the
//! workflows it knows about. The plugin reduces N such observations into one
//! agreed [`Outcome`]:
//! - a [`RoutingState`] that grows or shrinks the number of routable shards
//!   through a time-gated transition
//! - a deterministic workflow → shard mapping computed with a bounded-load
//!   consistent-hash ring, identical on every node without coordination
//!
//! Data flow:
//!
//! ```text
//! Store ──observation──▶ OCR3 engine ──outcome──▶ RingPlugin::outcome
//!   ▲                                               (router + next_state)
//!   └────────── RingTransmitter::transmit ◀── reports ──┘
//!                      │
//!                      └──▶ ArbiterScaler::consensus_want_shards
//! ```

pub mod arbiter;
pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod plugin;
pub mod router;
pub mod state;
pub mod store;
pub mod transmitter;
pub mod types;

pub use arbiter::ArbiterScaler;
pub use clock::{Clock, SystemClock};
pub use config::ConsensusConfig;
pub use error::{Result, RingError};
pub use factory::RingFactory;
pub use plugin::{RingPlugin, MAX_ORACLES};
pub use router::{assign_shard, HashRing};
pub use state::next_state;
pub use store::Store;
pub use transmitter::RingTransmitter;
pub use types::*;
