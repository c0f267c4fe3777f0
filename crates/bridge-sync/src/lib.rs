//! # Bridge Sync
//!
//! Reconciliation and delivery engine for the PMS ↔ channel manager bridge.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             bridge-sync                                 │
//! │                                                                         │
//! │   inbound                                outbound                       │
//! │  ┌──────────────────┐   ┌──────────┐   ┌─────────────────────┐          │
//! │  │ BookingReconciler│──▶│  SQLite  │◀──│ SyncQueueProcessor  │──▶ CM    │
//! │  │ (webhook events) │   │  ledger  │   │ RetryQueueProcessor │──▶ CM    │
//! │  └──────────────────┘   └──────────┘   │ Housekeeper         │          │
//! │                                        └─────────────────────┘          │
//! │                                          owned by Supervisor            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inbound booking events mutate the inventory ledger synchronously; the
//! outbound side drains queue tables on fixed intervals and talks to the
//! channel manager (CM) through the shared [`ChannelPusher`].

pub mod config;
pub mod error;
pub mod housekeeper;
pub mod outbound;
pub mod pusher;
pub mod reconciler;
pub mod retry;
pub mod supervisor;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use housekeeper::{Housekeeper, HousekeeperHandle};
pub use outbound::{SyncQueueProcessor, SyncQueueProcessorHandle};
pub use pusher::ChannelPusher;
pub use reconciler::BookingReconciler;
pub use retry::{retry_delay, RetryQueueProcessor, RetryQueueProcessorHandle};
pub use supervisor::Supervisor;
