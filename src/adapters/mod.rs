//! Adapters: concrete implementations of the port traits.
//!
//! Each adapter implements one or more traits from [`crate::app::ports`],
//! bridging the domain core to a real resource.
//!
//! | Adapter | Ports |
//! |---|---|
//! | [`http::HttpGateway`] | `ScheduleSource`, `SensorGateway` |
//! | [`file_store::FileStore`] | `StoragePort` |
//! | [`memory_store::MemoryStore`] | `StoragePort` |
//! | [`clock::SystemClock`], [`clock::ManualClock`] | `Clock` |
//! | [`log_reporter::LogReporter`] | `Reporter` |

pub mod clock;
pub mod file_store;
pub mod http;
pub mod log_reporter;
pub mod memory_store;
