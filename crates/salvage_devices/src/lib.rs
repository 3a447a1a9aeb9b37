//! # SALVAGE Devices
//!
//! When recycling happens: per-device activity, processing intervals and
//! the cooperative callback queue that drives them.
//!
//! ## Architecture
//!
//! ```text
//! host events ──> RecyclerRuntime ──> DeviceRegistry ──> DeviceController
//!                      │                                    │
//!                      └── advance ──> TickScheduler <──────┘ schedule / cancel
//!                                           │
//!                           due events ─────┴──> DeviceController ──> ConversionEngine
//! ```
//!
//! ## Threading
//!
//! Single-threaded. All callbacks run synchronously inside
//! [`RecyclerRuntime::tick`]; one device's step is never interleaved with
//! another's.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod controller;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod speed;

pub use controller::{Activity, ControllerContext, DeviceController, SpeedMode, StopReason};
pub use registry::{DeviceHost, DeviceRegistry};
pub use runtime::RecyclerRuntime;
pub use scheduler::{TickScheduler, TimerEvent, TimerHandle};
pub use speed::{SpeedPolicy, SpeedTier};
