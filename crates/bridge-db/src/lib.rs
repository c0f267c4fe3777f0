//! # bridge-db: Database Layer for Channel Bridge
//!
//! SQLite persistence for the reconciliation service: the connection pool,
//! embedded migrations, and one repository per table family.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  webhook handler / queue processors (bridge-sync, bridge-api)       │
//! │        │                                                            │
//! │        ▼                                                            │
//! │  bridge-db (THIS CRATE)                                             │
//! │    Database (pool.rs) ──► repositories ──► migrations (embedded)    │
//! │        │                                                            │
//! │        ▼                                                            │
//! │  SQLite database (WAL mode)                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The queue tables double as the coordination mechanism between the HTTP
//! side and the background processors; there is no in-process queue.
//!
//! ## Usage
//! ```rust,ignore
//! use bridge_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bridge.db")).await?;
//! let room_id = db.mappings().to_local("DLX-KING").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::booking::BookingRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::log::AuditLogRepository;
pub use repository::mapping::RoomMappingRepository;
pub use repository::retry_queue::RetryQueueRepository;
pub use repository::settings::ChannelSettingsRepository;
pub use repository::sync_queue::SyncQueueRepository;
