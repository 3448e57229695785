//! PetFeeder dispatch engine.
//!
//! Client-side scheduler for the PetFeeder food/water dispenser: polls the
//! backend for feeding schedules, fires each slot at most once per day,
//! and keeps the water plate topped up.  All I/O goes through the port
//! traits in [`app::ports`]; [`adapters`] provides the real ones.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod routine;
pub mod schedule;
pub mod scheduler;
pub mod water;
