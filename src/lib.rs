//! CampusHub - Subscription & Admin-Delegation Core
//!
//! CampusHub is the consistency core of a campus-community backend: users
//! subscribe to hierarchical channels and sub-channels, institutions manage
//! admin hierarchies, and every membership change must be reflected in three
//! places at once - the membership rows, the group's denormalized subscriber
//! counter, and the push provider's topic subscriptions.
//!
//! # Overview
//!
//! This library provides:
//! - Subscription toggling with counter/topic reconciliation
//! - Admin invitations (the pending-admin ledger) with short-lived bearer
//!   tokens
//! - Admin promotion with primary-channel and institution cascades
//! - Channel sub-admin rosters (suspend / reinstate / remove)
//!
//! # Module Structure
//!
//! - **`engine`** - the operations: `SubscriptionEngine`,
//!   `AdminDelegationEngine`, `InviteEngine`, `SubAdminEngine`
//! - **`store`** - persistence seam with PostgreSQL (`PgStore`) and
//!   in-memory (`MemoryStore`) implementations
//! - **`push`** - the Topic Bridge: `FcmClient` plus a recording test double
//! - **`domain`** / **`error`** / **`identity`** / **`tokens`** /
//!   **`config`** - entities, the error taxonomy, the explicit acting
//!   identity, invite tokens, and environment configuration
//!
//! The HTTP layer is intentionally absent: a transport resolves the caller
//! to an `identity::ActingIdentity` and maps `error::EngineError` through
//! `error::StatusClass`.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod identity;
pub mod push;
pub mod store;
pub mod tokens;

pub use config::Config;
pub use engine::{
    AdminDelegationEngine, AdminInvite, AdminInviteRequest, GroupSnapshot, InviteEngine,
    InviteTarget, PromotionOutcome, SubAdminEngine, SubscriptionEngine, ToggleAction,
    ToggleOutcome,
};
pub use error::{EngineError, EngineResult, StatusClass};
pub use identity::ActingIdentity;
pub use push::{FcmClient, PushTarget, RecordingBridge, TopicBridge};
pub use store::{MemoryStore, PgStore, Store};
