//! Coordination-free, roughly time-ordered 64-bit identifiers.
//!
//! Every [`SnowflakeId`] packs three fields, high bit first:
//!
//! ```text
//!  Bit Index:  63             22 21            14 13              0
//!              +----------------+----------------+----------------+
//!  Field:      | timestamp (42) |  node ID (8)   | iteration (14) |
//!              +----------------+----------------+----------------+
//!              |<----- MSB ---------- 64 bits --------- LSB ----->|
//! ```
//!
//! IDs from a single [`Generator`] are strictly increasing. IDs from
//! different generators are unique as long as their node IDs differ.
//!
//! ```
//! use nodeflake::{Generator, ManualClock};
//!
//! let generator = Generator::builder()
//!     .clock(ManualClock::new(1_626_786_340_918))
//!     .node_id(128)
//!     .build()
//!     .unwrap();
//!
//! let id = generator.next_id().unwrap();
//! assert_eq!(id.node_id(), 128);
//! assert_eq!(id.iteration(), 1);
//! assert_eq!(id.to_string(), "6823236456859828225");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod env;
mod error;
#[cfg(feature = "async-tokio")]
mod futures;
mod generator;
mod id;
mod node;
#[cfg(feature = "serde")]
pub mod serde;
mod time;

pub use crate::env::*;
pub use crate::error::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::node::*;
pub use crate::time::*;
