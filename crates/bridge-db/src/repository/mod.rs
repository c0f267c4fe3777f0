//! # Repository Implementations
//!
//! One repository per table family. All SQL lives here; the crates above
//! only see typed methods.
//!
//! - [`mapping`] - room_mapping (bidirectional id ↔ code lookups)
//! - [`inventory`] - inventory ledger (signed deltas only)
//! - [`booking`] - bookings (one row per reservation_id)
//! - [`sync_queue`] - outbound PMS changes awaiting delivery
//! - [`retry_queue`] - failed pushes awaiting backoff re-delivery
//! - [`settings`] - channel manager credentials
//! - [`log`] - webhook / channel audit trails

pub mod booking;
pub mod inventory;
pub mod log;
pub mod mapping;
pub mod retry_queue;
pub mod settings;
pub mod sync_queue;
