//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no backend
//! or dispenser controller required.

mod service_tests;
mod water_monitor_tests;
