// Copyright 2025 Zhipu AI (Original Python implementation)
// Copyright 2025 ModerRAS (Rust implementation)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Droid Tools
//!
//! Device-control abstraction for agents that automate Android devices.
//!
//! A driver implements the [`Tools`] contract: state query, gestures, text
//! input, navigation, app lifecycle, screenshots, package listing, scratch
//! memory and a completion signal. [`describe_tools`] turns any driver into
//! a name-keyed [`CapabilityMap`] that an agent can list and invoke with JSON
//! arguments, and [`ToolSession`] records every invocation as a trajectory.
//!
//! Two drivers ship with the crate: [`AdbTools`] for real devices over ADB
//! and [`MockTools`] for tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use droid_tools::{AdbTools, ToolSession, ToolsSettings};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ToolsSettings::load().with_env_overrides();
//!     let mut session = ToolSession::new(AdbTools::from_settings(&settings));
//!
//!     for (name, capability) in session.capabilities().iter() {
//!         println!("{}: {}", name, capability.description);
//!     }
//!
//!     let state = session.invoke("get_state", json!({})).await?;
//!     println!("{}", state);
//!     session.invoke("tap_by_index", json!({ "index": 0 })).await?;
//!     session.invoke("complete", json!([true, "Opened the first item"])).await?;
//!
//!     println!("Outcome: {:?}", session.outcome());
//!     Ok(())
//! }
//! ```

pub mod adb;
pub mod config;
pub mod describe;
pub mod session;
pub mod settings;
pub mod tools;

pub use adb::{AdbConnection, AdbError, AdbTools};
pub use describe::{describe_tools, Capability, CapabilityMap, Operation, ParamKind, ParamSpec};
pub use session::{StepOutcome, ToolSession, TrajectoryStep};
pub use settings::ToolsSettings;
pub use tools::{
    Bounds, CompletionRecord, CompletionSignal, DeviceState, MemoryEntry, MemoryStore, MockTools,
    PhoneState, Screenshot, Tools, ToolsError, UiElement, DEFAULT_SWIPE_DURATION_MS,
};
