//! `basalt-bus`: lock-free broadcast bus over shared memory.
//!
//! This crate provides a single-writer, many-reader messaging primitive
//! built on a fixed-capacity ring buffer of variable-length records. The
//! buffer is typically memory-mapped so that readers live in other
//! processes.
//!
//! # Core Components
//!
//! - [`Transmitter`]: publishes typed, length-prefixed records to the ring
//! - [`Receiver`]: scans the same ring and detects when it has been lapped
//! - [`AtomicBuffer`]: atomic load/store view over the shared byte region
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐      shared memory file      ┌─────────────┐
//! │ Transmitter │ ──────────────────────────── │  Receiver   │
//! │ (Process A) │        (mmap region)         │ (Process B) │
//! └─────────────┘                              └─────────────┘
//!                                              ┌─────────────┐
//!                                              │  Receiver   │
//!                                              │ (Process C) │
//!                                              └─────────────┘
//! ```
//!
//! The region is a data ring of power-of-two capacity followed by a trailer
//! of three monotonic counters (`tail_intent`, `tail`, `latest`). The
//! transmitter never blocks: a slow receiver is lapped and discovers it
//! through the `tail_intent` counter.
//!
//! # Example
//!
//! ```ignore
//! use basalt_bus::{Receiver, Transmitter};
//!
//! // Producer (typically in one process)
//! let mut tx = Transmitter::create("/tmp/bus.bin", 1 << 20)?;
//! tx.transmit(42, b"hello")?;
//!
//! // Consumer (can be in same or different process)
//! let mut rx = Receiver::open("/tmp/bus.bin")?;
//! let mut msg = Vec::new();
//! if let Some(msg_type_id) = rx.try_read(&mut msg) {
//!     println!("Received type {msg_type_id}: {msg:?}");
//! }
//! ```
//!
//! # Internal Modules
//!
//! - `broadcast`: transmitter and receiver implementation
//! - `buffer`: atomic access primitives over raw shared bytes
//! - `layout`: trailer counter offsets and capacity validation
//! - `record`: record header layout and alignment arithmetic

mod broadcast;
mod buffer;
mod error;
pub mod layout;
pub mod record;

pub use broadcast::{Receiver, Transmitter};
pub use buffer::AtomicBuffer;
pub use error::BroadcastError;
