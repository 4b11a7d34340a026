//! Core domain types and utilities for the reclaim platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the reclaim lost-and-found document tracker.

pub mod error;
pub mod id;
pub mod identity;

pub use error::Result;
pub use id::{FlowId, ParseFlowIdError};
pub use identity::{Email, Identity, ProviderUserId};
