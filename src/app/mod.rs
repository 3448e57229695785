//! Application core: the dispatch engine's public face.
//!
//! [`ports`] defines every boundary the core talks through; [`service`]
//! assembles the evaluator, routines and water monitor behind one facade.
//! Nothing in here knows about HTTP, files or a UI framework.

pub mod ports;
pub mod service;
