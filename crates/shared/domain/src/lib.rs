//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `bitflags`).
//! Keep it lean: no I/O, networking, or heavy logic, just data and the tier rule table.

pub mod component;
pub mod config;
pub mod constants;
pub mod events;
pub mod registry;
pub mod role;
pub mod slug;
pub mod tier;
