//! [`Tools`] implementation backed by the `adb` command line.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

use super::connection::AdbConnection;
use super::{device, input, screenshot, ui};
use crate::config::is_valid_keycode;
use crate::describe::{Capability, Operation};
use crate::settings::ToolsSettings;
use crate::tools::{
    CompletionSignal, DeviceState, MemoryStore, PhoneState, Screenshot, Tools, ToolsError,
};

/// Drives a real device or emulator through ADB.
///
/// # Example
///
/// ```rust,no_run
/// use droid_tools::{AdbTools, Tools};
///
/// # async fn demo() -> Result<(), droid_tools::ToolsError> {
/// let mut tools = AdbTools::new(Default::default());
/// let state = tools.get_state().await?;
/// if let Some(search) = state.elements.iter().find(|e| e.label().contains("Search")) {
///     tools.tap_by_index(search.index).await;
/// }
/// # Ok(())
/// # }
/// ```
pub struct AdbTools {
    conn: AdbConnection,
    action_delay_ms: u64,
    swipe_duration_ms: u64,
    manage_keyboard: bool,
    snapshot: Option<DeviceState>,
    memory: MemoryStore,
    completion: CompletionSignal,
}

impl AdbTools {
    /// Create a driver over an existing connection.
    pub fn new(conn: AdbConnection) -> Self {
        let defaults = ToolsSettings::default();
        Self {
            conn,
            action_delay_ms: defaults.action_delay_ms,
            swipe_duration_ms: defaults.swipe_duration_ms,
            manage_keyboard: defaults.manage_keyboard,
            snapshot: None,
            memory: MemoryStore::new(),
            completion: CompletionSignal::new(),
        }
    }

    /// Create a driver from persisted settings.
    pub fn from_settings(settings: &ToolsSettings) -> Self {
        let mut conn = AdbConnection::new().with_path(&settings.adb_path);
        if let Some(id) = settings.device() {
            conn = conn.with_device(id);
        }
        Self::new(conn)
            .with_action_delay(settings.action_delay_ms)
            .with_swipe_duration(settings.swipe_duration_ms)
            .with_keyboard_management(settings.manage_keyboard)
    }

    /// Delay after each delivered action so the UI can settle.
    pub fn with_action_delay(mut self, delay_ms: u64) -> Self {
        self.action_delay_ms = delay_ms;
        self
    }

    /// Swipe duration advertised as the `duration_ms` default. Zero is ignored.
    pub fn with_swipe_duration(mut self, duration_ms: u64) -> Self {
        if duration_ms > 0 {
            self.swipe_duration_ms = duration_ms;
        }
        self
    }

    pub fn swipe_duration_ms(&self) -> u64 {
        self.swipe_duration_ms
    }

    /// Toggle switching to ADB Keyboard around text input.
    pub fn with_keyboard_management(mut self, enabled: bool) -> Self {
        self.manage_keyboard = enabled;
        self
    }

    pub fn connection(&self) -> &AdbConnection {
        &self.conn
    }

    /// The snapshot `tap_by_index` resolves against.
    pub fn last_state(&self) -> Option<&DeviceState> {
        self.snapshot.as_ref()
    }

    async fn settle(&self) {
        if self.action_delay_ms > 0 {
            sleep(Duration::from_millis(self.action_delay_ms)).await;
        }
    }

    /// Log a delivery failure and fold it into the boolean result.
    async fn delivered<E: std::fmt::Display>(&self, action: &str, result: Result<(), E>) -> bool {
        match result {
            Ok(()) => {
                self.settle().await;
                true
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", action, e);
                false
            }
        }
    }

    async fn type_with_keyboard(&self, text: &str) -> Result<(), super::AdbError> {
        if !self.manage_keyboard {
            return input::type_text(&self.conn, text).await;
        }

        let original_ime = input::detect_and_set_adb_keyboard(&self.conn).await?;
        self.settle().await;

        let typed = async {
            input::clear_text(&self.conn).await?;
            input::type_text(&self.conn, text).await
        }
        .await;

        // Restore the keyboard even when typing failed.
        if let Err(e) = input::restore_keyboard(&self.conn, &original_ime).await {
            tracing::warn!("Failed to restore keyboard {}: {}", original_ime, e);
        }
        typed
    }
}

#[async_trait]
impl Tools for AdbTools {
    async fn get_state(&mut self) -> Result<DeviceState, ToolsError> {
        let (xml, _) = self.conn.exec_out(&["uiautomator", "dump", "/dev/tty"]).await?;
        let xml = String::from_utf8_lossy(&xml);
        if !xml.contains("<hierarchy") {
            return Err(ToolsError::DeviceUnavailable(format!(
                "UI hierarchy dump failed: {}",
                xml.trim()
            )));
        }

        let dump = ui::parse_hierarchy(&xml);
        let package = device::current_package(&self.conn).await?.or(dump.package);
        let keyboard_visible = device::keyboard_shown(&self.conn).await?;

        let phone_state = PhoneState {
            current_app: package.clone(),
            package,
            keyboard_visible,
            focused_element: dump.focused,
        };
        let state = DeviceState::new(phone_state, dump.elements);
        tracing::debug!("State refreshed: {} elements", state.len());

        self.snapshot = Some(state.clone());
        Ok(state)
    }

    async fn tap_by_index(&mut self, index: usize) -> bool {
        let Some(element) = self.snapshot.as_ref().and_then(|s| s.element(index)) else {
            tracing::debug!("Tap index {} is not in the current snapshot", index);
            return false;
        };
        let (x, y) = element.bounds.center();
        let result = device::tap(&self.conn, x, y).await;
        self.delivered("tap", result).await
    }

    async fn swipe(
        &mut self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u64,
    ) -> bool {
        if duration_ms == 0 {
            return false;
        }
        let result = device::swipe(&self.conn, start_x, start_y, end_x, end_y, duration_ms).await;
        self.delivered("swipe", result).await
    }

    async fn input_text(&mut self, text: &str) -> bool {
        match device::keyboard_shown(&self.conn).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("No focused input field, skipping text input");
                return false;
            }
            Err(e) => {
                tracing::warn!("input_text failed: {}", e);
                return false;
            }
        }
        let result = self.type_with_keyboard(text).await;
        self.delivered("input_text", result).await
    }

    async fn back(&mut self) -> bool {
        let result = device::back(&self.conn).await;
        self.delivered("back", result).await
    }

    async fn press_key(&mut self, keycode: i32) -> bool {
        if !is_valid_keycode(keycode) {
            return false;
        }
        let result = device::key_event(&self.conn, keycode).await;
        self.delivered("press_key", result).await
    }

    async fn start_app(&mut self, package: &str, activity: &str) -> bool {
        if package.trim().is_empty() {
            return false;
        }
        match device::package_installed(&self.conn, package).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Package {} is not installed", package);
                return false;
            }
            Err(e) => {
                tracing::warn!("start_app failed: {}", e);
                return false;
            }
        }
        let result = device::launch_app(&self.conn, package, activity).await;
        self.delivered("start_app", result).await
    }

    async fn take_screenshot(&mut self) -> Result<Screenshot, ToolsError> {
        Ok(screenshot::get_screenshot(&self.conn).await?)
    }

    async fn list_packages(&mut self, include_system_apps: bool) -> Result<Vec<String>, ToolsError> {
        Ok(device::list_packages(&self.conn, include_system_apps).await?)
    }

    fn capability(&self, operation: Operation) -> Capability {
        match operation {
            Operation::Swipe => operation
                .capability()
                .with_default("duration_ms", json!(self.swipe_duration_ms)),
            _ => operation.capability(),
        }
    }

    fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    fn completion_mut(&mut self) -> &mut CompletionSignal {
        &mut self.completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{bind_args, describe_tools, Target};

    fn unreachable_tools() -> AdbTools {
        let conn = AdbConnection::new().with_path("/nonexistent/droid-tools-test/adb");
        AdbTools::new(conn).with_action_delay(0)
    }

    #[test]
    fn test_from_settings() {
        let settings = ToolsSettings {
            adb_path: "/opt/android/adb".to_string(),
            device_id: "emulator-5554".to_string(),
            action_delay_ms: 0,
            swipe_duration_ms: 1000,
            ..Default::default()
        };
        let tools = AdbTools::from_settings(&settings);
        assert_eq!(tools.connection().adb_path(), "/opt/android/adb");
        assert_eq!(tools.connection().device_id(), Some("emulator-5554"));
        assert_eq!(tools.swipe_duration_ms(), 1000);
        assert!(tools.last_state().is_none());
    }

    #[test]
    fn test_configured_swipe_duration_is_advertised() {
        let settings = ToolsSettings {
            swipe_duration_ms: 1000,
            ..Default::default()
        };
        let map = describe_tools(&AdbTools::from_settings(&settings));
        let swipe = map.get("swipe").unwrap();
        assert_eq!(swipe.params[4].default, Some(json!(1000)));
        assert_eq!(swipe.target, Target::Builtin(Operation::Swipe));

        let bound = bind_args(swipe, json!([0, 800, 0, 200])).unwrap();
        assert_eq!(bound["duration_ms"], 1000);
    }

    #[test]
    fn test_zero_swipe_duration_keeps_default() {
        let tools = unreachable_tools().with_swipe_duration(0);
        assert_eq!(tools.swipe_duration_ms(), 300);
        let map = describe_tools(&tools);
        assert_eq!(map.get("swipe").unwrap().params[4].default, Some(json!(300)));
    }

    /// Stand-in `adb` that joins shell arguments with spaces like the real
    /// one, so an empty `--es msg` value reaches `am` as a missing argument.
    #[cfg(unix)]
    fn fake_adb(dir: &std::path::Path) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = r#"#!/bin/sh
[ "$1" = "shell" ] || exit 0
shift
cmd="$*"
case "$cmd" in
  "dumpsys input_method") echo "  mInputShown=true" ;;
  "settings get secure default_input_method") echo "com.android.adbkeyboard/.AdbIME" ;;
  *"--es msg"|*"--es msg ") echo "Error: no value given for --es msg" >&2; exit 1 ;;
  "am broadcast"*) echo "Broadcast completed: result=0" ;;
esac
exit 0
"#;
        let path = dir.join("adb");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_input_text_accepts_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let conn = AdbConnection::new().with_path(fake_adb(dir.path()));
        let mut tools = AdbTools::new(conn).with_action_delay(0);

        assert!(tools.input_text("hello").await);
        assert!(tools.input_text("").await);

        let mut tools = tools.with_keyboard_management(false);
        assert!(tools.input_text("").await);
    }

    #[test]
    fn test_describes_full_base_set() {
        let map = describe_tools(&unreachable_tools());
        assert_eq!(map.len(), 12);
    }

    #[tokio::test]
    async fn test_missing_adb_is_unavailable() {
        let mut tools = unreachable_tools();
        assert!(matches!(
            tools.get_state().await,
            Err(ToolsError::DeviceUnavailable(_))
        ));
        assert!(matches!(
            tools.take_screenshot().await,
            Err(ToolsError::Capture(_))
        ));
        assert!(matches!(
            tools.list_packages(true).await,
            Err(ToolsError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_actions_fold_to_false() {
        let mut tools = unreachable_tools();
        assert!(!tools.tap_by_index(0).await);
        assert!(!tools.swipe(0, 0, 100, 100, 300).await);
        assert!(!tools.swipe(0, 0, 100, 100, 0).await);
        assert!(!tools.input_text("hi").await);
        assert!(!tools.back().await);
        assert!(!tools.press_key(4).await);
        assert!(!tools.press_key(-7).await);
        assert!(!tools.start_app("", "").await);
        assert!(!tools.start_app("com.android.settings", "").await);
        assert_eq!(tools.remember("offline note").await, "offline note");
        assert!(tools.complete(false, "no device").await);
    }
}
