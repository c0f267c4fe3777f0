//! # bridge-core: Pure Domain Logic for Channel Bridge
//!
//! Everything in this crate is deterministic and free of I/O: the booking
//! event and queue record types, the channel manager payload builders, and
//! the room-night calendar math.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  bridge-core (THIS CRATE)    pure types + payload building          │
//! │        ▲              ▲                                             │
//! │  bridge-db       bridge-sync                                        │
//! │  (SQLite rows)   (reconciler, queue processors, pusher)             │
//! │                       ▲                                             │
//! │                  apps/bridge-api (HTTP routing)                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Golden Rule: NO I/O ALLOWED
//! Database queries, network requests and async code live in the crates
//! above. This keeps payload building and delta math testable without mocks.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod payload;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use calendar::nights;
pub use error::{CoreError, CoreResult};
pub use payload::{build_update, RangeUpdate, RoomUpdate, UpdateEnvelope};
pub use types::{
    BookingAction, BookingEvent, BookingRecord, ChannelSettings, InventoryLevel, RetryQueueItem,
    RoomMapping, RoomStay, SyncItemKind, SyncItemStatus, SyncQueueItem,
};
