//! The device tool contract.
//!
//! [`Tools`] is the full action surface a device driver exposes to an agent:
//! state query, gestures, text, navigation, app lifecycle, screenshots,
//! package listing, scratch memory and the completion signal.
//!
//! Interactive actions report recoverable failures as `false`. Only
//! acquisition failures (`get_state`, `take_screenshot`, `list_packages` on a
//! dead transport) return an error.

mod completion;
mod error;
mod memory;
pub mod mock;
mod state;

pub use completion::{CompletionRecord, CompletionSignal};
pub use error::ToolsError;
pub use memory::{MemoryEntry, MemoryStore};
pub use mock::MockTools;
pub use state::{Bounds, DeviceState, PhoneState, Screenshot, UiElement};

use async_trait::async_trait;
use serde_json::Value;

use crate::describe::{Capability, Operation};

/// Swipe duration used when the caller does not give one.
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;

/// Device tool contract implemented by every driver.
///
/// An instance belongs to one automation session and one caller. Element
/// indices passed to [`Tools::tap_by_index`] refer to the most recent
/// [`Tools::get_state`] snapshot.
#[async_trait]
pub trait Tools: Send + Sync {
    /// Capture the current device state and refresh the element index.
    async fn get_state(&mut self) -> Result<DeviceState, ToolsError>;

    /// Tap the element at `index` in the latest snapshot.
    ///
    /// Returns `false` when the index is out of range, no snapshot exists,
    /// or the tap could not be delivered.
    async fn tap_by_index(&mut self, index: usize) -> bool;

    /// Swipe between two device-space points.
    ///
    /// A zero `duration_ms` is rejected with `false`.
    async fn swipe(
        &mut self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u64,
    ) -> bool;

    /// Type text into the focused field. Empty text is allowed.
    async fn input_text(&mut self, text: &str) -> bool;

    /// Press the system back button.
    async fn back(&mut self) -> bool;

    /// Send a platform key event.
    async fn press_key(&mut self, keycode: i32) -> bool;

    /// Launch an app. An empty `activity` launches the default entry point.
    async fn start_app(&mut self, package: &str, activity: &str) -> bool;

    /// Capture the screen.
    async fn take_screenshot(&mut self) -> Result<Screenshot, ToolsError>;

    /// List installed packages. An empty device yields an empty list.
    async fn list_packages(&mut self, include_system_apps: bool)
        -> Result<Vec<String>, ToolsError>;

    fn memory(&self) -> &MemoryStore;

    /// Storage behind `remember`. Notes can only be appended from inside
    /// this crate, through [`Tools::remember`].
    fn memory_mut(&mut self) -> &mut MemoryStore;

    fn completion(&self) -> &CompletionSignal;

    /// Storage behind `complete`. The record is written only by
    /// [`Tools::complete`] and cleared only by
    /// [`ToolSession::begin_task`](crate::ToolSession::begin_task).
    fn completion_mut(&mut self) -> &mut CompletionSignal;

    /// Store a note and echo it back.
    async fn remember(&mut self, information: &str) -> String {
        self.memory_mut().append(information)
    }

    /// All notes, oldest first.
    async fn get_memory(&self) -> Vec<String> {
        self.memory().texts()
    }

    /// Record the task outcome. Does not stop anything.
    async fn complete(&mut self, success: bool, reason: &str) -> bool {
        self.completion_mut().record(success, reason)
    }

    /// Whether this driver implements a base operation.
    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    /// Descriptor entry for a supported base operation.
    ///
    /// Override to advertise driver-specific defaults. The entry keeps
    /// dispatching to the trait method.
    fn capability(&self, operation: Operation) -> Capability {
        operation.capability()
    }

    /// Operations this driver adds on top of the base set.
    fn extensions(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Execute an operation declared in [`Tools::extensions`].
    async fn invoke_extension(&mut self, name: &str, _args: Value) -> Result<Value, ToolsError> {
        Err(ToolsError::UnknownOperation(name.to_string()))
    }
}
