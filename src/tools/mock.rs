//! Simulated device for tests and dry runs.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

use super::{
    CompletionSignal, DeviceState, MemoryStore, PhoneState, Screenshot, Tools, ToolsError,
    UiElement,
};
use crate::config::is_valid_keycode;

/// An action the simulated device accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAction {
    Tap { index: usize, x: i32, y: i32 },
    Swipe { start: (i32, i32), end: (i32, i32), duration_ms: u64 },
    Text(String),
    Back,
    Key(i32),
    StartApp { package: String, activity: String },
}

/// An installed package on the simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPackage {
    pub name: String,
    pub system: bool,
}

/// In-memory [`Tools`] implementation.
///
/// The live screen can be changed between calls with [`MockTools::set_screen`]
/// to model the UI moving under the agent; taps keep resolving against the
/// last snapshot handed out by `get_state`.
#[derive(Debug, Clone)]
pub struct MockTools {
    connected: bool,
    screen: Vec<UiElement>,
    snapshot: Option<DeviceState>,
    packages: Vec<MockPackage>,
    foreground: Option<String>,
    focused_field: bool,
    screen_size: (u32, u32),
    actions: Vec<MockAction>,
    memory: MemoryStore,
    completion: CompletionSignal,
}

impl Default for MockTools {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTools {
    /// A connected device with an empty screen and no apps.
    pub fn new() -> Self {
        Self {
            connected: true,
            screen: Vec::new(),
            snapshot: None,
            packages: Vec::new(),
            foreground: None,
            focused_field: false,
            screen_size: (540, 1200),
            actions: Vec::new(),
            memory: MemoryStore::new(),
            completion: CompletionSignal::new(),
        }
    }

    /// Set the elements currently on screen.
    pub fn with_elements(mut self, elements: Vec<UiElement>) -> Self {
        self.screen = elements;
        self
    }

    /// Install a package.
    pub fn with_package(mut self, name: impl Into<String>, system: bool) -> Self {
        self.packages.push(MockPackage {
            name: name.into(),
            system,
        });
        self
    }

    /// Whether a text field has input focus.
    pub fn with_focused_field(mut self, focused: bool) -> Self {
        self.focused_field = focused;
        self
    }

    /// Pixel size of captured screenshots.
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_size = (width, height);
        self
    }

    /// Start disconnected.
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Replace the live screen without touching the last snapshot.
    pub fn set_screen(&mut self, elements: Vec<UiElement>) {
        self.screen = elements;
    }

    /// Actions delivered so far, in order.
    pub fn actions(&self) -> &[MockAction] {
        &self.actions
    }

    /// Package currently in the foreground.
    pub fn foreground(&self) -> Option<&str> {
        self.foreground.as_deref()
    }

    fn render_png(&self) -> Result<Vec<u8>, ToolsError> {
        let (width, height) = self.screen_size;
        let img = RgbImage::from_fn(width, height, |_, _| image::Rgb([255u8, 255u8, 255u8]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| ToolsError::Capture(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer.into_inner())
    }
}

#[async_trait]
impl Tools for MockTools {
    async fn get_state(&mut self) -> Result<DeviceState, ToolsError> {
        if !self.connected {
            return Err(ToolsError::DeviceUnavailable(
                "simulated device is disconnected".to_string(),
            ));
        }
        let phone_state = PhoneState {
            current_app: self.foreground.clone(),
            package: self.foreground.clone(),
            keyboard_visible: self.focused_field,
            focused_element: self
                .screen
                .iter()
                .find(|e| e.focused)
                .map(|e| e.label().to_string()),
        };
        let state = DeviceState::new(phone_state, self.screen.clone());
        self.snapshot = Some(state.clone());
        Ok(state)
    }

    async fn tap_by_index(&mut self, index: usize) -> bool {
        if !self.connected {
            return false;
        }
        let Some(element) = self.snapshot.as_ref().and_then(|s| s.element(index)) else {
            return false;
        };
        let (x, y) = element.bounds.center();
        self.actions.push(MockAction::Tap { index, x, y });
        true
    }

    async fn swipe(
        &mut self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u64,
    ) -> bool {
        if !self.connected || duration_ms == 0 {
            return false;
        }
        self.actions.push(MockAction::Swipe {
            start: (start_x, start_y),
            end: (end_x, end_y),
            duration_ms,
        });
        true
    }

    async fn input_text(&mut self, text: &str) -> bool {
        if !self.connected || !self.focused_field {
            return false;
        }
        self.actions.push(MockAction::Text(text.to_string()));
        true
    }

    async fn back(&mut self) -> bool {
        if !self.connected {
            return false;
        }
        self.actions.push(MockAction::Back);
        true
    }

    async fn press_key(&mut self, keycode: i32) -> bool {
        if !self.connected || !is_valid_keycode(keycode) {
            return false;
        }
        self.actions.push(MockAction::Key(keycode));
        true
    }

    async fn start_app(&mut self, package: &str, activity: &str) -> bool {
        if !self.connected || package.is_empty() {
            return false;
        }
        if !self.packages.iter().any(|p| p.name == package) {
            return false;
        }
        self.foreground = Some(package.to_string());
        self.actions.push(MockAction::StartApp {
            package: package.to_string(),
            activity: activity.to_string(),
        });
        true
    }

    async fn take_screenshot(&mut self) -> Result<Screenshot, ToolsError> {
        if !self.connected {
            return Err(ToolsError::Capture(
                "simulated device is disconnected".to_string(),
            ));
        }
        let data = self.render_png()?;
        let (width, height) = self.screen_size;
        Ok(Screenshot::png(
            format!("mock-{}", uuid::Uuid::new_v4()),
            width,
            height,
            data,
        ))
    }

    async fn list_packages(&mut self, include_system_apps: bool) -> Result<Vec<String>, ToolsError> {
        if !self.connected {
            return Err(ToolsError::DeviceUnavailable(
                "simulated device is disconnected".to_string(),
            ));
        }
        let mut names: Vec<String> = self
            .packages
            .iter()
            .filter(|p| include_system_apps || !p.system)
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        Ok(names)
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
    use crate::tools::Bounds;

    fn element(text: &str, top: i32) -> UiElement {
        UiElement {
            class_name: "android.widget.Button".to_string(),
            text: text.to_string(),
            bounds: Bounds::new(0, top, 200, top + 100),
            clickable: true,
            ..Default::default()
        }
    }

    fn device() -> MockTools {
        MockTools::new()
            .with_elements(vec![element("Search", 0), element("Settings", 100)])
            .with_package("com.example.notes", false)
            .with_package("com.android.settings", true)
            .with_package("com.android.chrome", true)
    }

    #[tokio::test]
    async fn test_tap_valid_index() {
        let mut tools = device();
        let state = tools.get_state().await.unwrap();
        assert_eq!(state.len(), 2);

        assert!(tools.tap_by_index(1).await);
        assert_eq!(
            tools.actions(),
            &[MockAction::Tap {
                index: 1,
                x: 100,
                y: 150
            }]
        );
    }

    #[tokio::test]
    async fn test_tap_out_of_range_returns_false() {
        let mut tools = device();
        // No snapshot yet.
        assert!(!tools.tap_by_index(0).await);

        tools.get_state().await.unwrap();
        assert!(!tools.tap_by_index(2).await);
        assert!(!tools.tap_by_index(usize::MAX).await);
        assert!(tools.actions().is_empty());
    }

    #[tokio::test]
    async fn test_tap_resolves_against_latest_snapshot() {
        let mut tools = device();
        tools.get_state().await.unwrap();

        tools.set_screen(vec![element("Only", 500)]);
        // Index 1 still refers to the old snapshot until state is refreshed.
        assert!(tools.tap_by_index(1).await);

        tools.get_state().await.unwrap();
        assert!(!tools.tap_by_index(1).await);
        assert!(tools.tap_by_index(0).await);
    }

    #[tokio::test]
    async fn test_get_state_does_not_mutate_device() {
        let mut tools = device();
        let first = tools.get_state().await.unwrap();
        let second = tools.get_state().await.unwrap();
        assert_eq!(first, second);
        assert!(tools.actions().is_empty());
    }

    #[tokio::test]
    async fn test_remember_appends_in_order() {
        let mut tools = device();
        for note in ["one", "two", "two", "three"] {
            assert_eq!(tools.remember(note).await, note);
            assert_eq!(tools.get_memory().await.last().map(String::as_str), Some(note));
        }
        assert_eq!(tools.get_memory().await, vec!["one", "two", "two", "three"]);
    }

    #[tokio::test]
    async fn test_complete_last_write_wins() {
        let mut tools = device();
        assert!(tools.complete(true, "done").await);
        let record = tools.completion().get().unwrap();
        assert!(record.success);
        assert_eq!(record.reason, "done");

        assert!(tools.complete(false, "blocked by captcha").await);
        let record = tools.completion().get().unwrap();
        assert!(!record.success);
        assert_eq!(record.reason, "blocked by captcha");
    }

    #[tokio::test]
    async fn test_list_packages_subset() {
        let mut tools = device();
        let user = tools.list_packages(false).await.unwrap();
        let all = tools.list_packages(true).await.unwrap();
        assert_eq!(user, vec!["com.example.notes"]);
        assert_eq!(all.len(), 3);
        assert!(user.iter().all(|p| all.contains(p)));
    }

    #[tokio::test]
    async fn test_list_packages_empty_device() {
        let mut tools = MockTools::new();
        assert_eq!(tools.list_packages(true).await, Ok(Vec::new()));
        assert_eq!(tools.list_packages(false).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_screenshot_disconnected_is_capture_error() {
        let mut tools = device().disconnected();
        let err = tools.take_screenshot().await.unwrap_err();
        assert!(matches!(err, ToolsError::Capture(_)));

        let err = tools.get_state().await.unwrap_err();
        assert!(matches!(err, ToolsError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_screenshot_is_png() {
        let mut tools = device().with_screen_size(20, 40);
        let shot = tools.take_screenshot().await.unwrap();
        assert_eq!((shot.width, shot.height), (20, 40));
        assert_eq!(&shot.data[0..8], b"\x89PNG\r\n\x1a\n");
        let (id, bytes) = shot.into_pair();
        assert!(id.starts_with("mock-"));
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_input_text_needs_focus() {
        let mut tools = device();
        assert!(!tools.input_text("hello").await);

        let mut tools = device().with_focused_field(true);
        assert!(tools.input_text("").await);
        assert!(tools.input_text("hello").await);
        assert_eq!(tools.actions().len(), 2);
    }

    #[tokio::test]
    async fn test_swipe_and_keys() {
        let mut tools = device();
        assert!(!tools.swipe(0, 0, 10, 10, 0).await);
        assert!(tools.swipe(0, 0, 10, 10, 300).await);
        assert!(tools.press_key(66).await);
        assert!(!tools.press_key(0).await);
        assert!(!tools.press_key(10_000).await);
        assert!(tools.back().await);
    }

    #[tokio::test]
    async fn test_start_app() {
        let mut tools = device();
        assert!(!tools.start_app("", "").await);
        assert!(!tools.start_app("com.unknown.app", "").await);
        assert!(tools.start_app("com.example.notes", "").await);
        assert_eq!(tools.foreground(), Some("com.example.notes"));

        let state = tools.get_state().await.unwrap();
        assert_eq!(state.phone_state.package.as_deref(), Some("com.example.notes"));
        // The foreground app is identified by its package id.
        assert_eq!(state.phone_state.current_app, state.phone_state.package);
    }

    #[tokio::test]
    async fn test_disconnected_actions_return_false() {
        let mut tools = device();
        tools.get_state().await.unwrap();
        tools.set_connected(false);

        assert!(!tools.tap_by_index(0).await);
        assert!(!tools.swipe(0, 0, 1, 1, 300).await);
        assert!(!tools.back().await);
        assert!(!tools.press_key(4).await);
        assert!(!tools.start_app("com.example.notes", "").await);
        // Memory and completion never fail.
        assert_eq!(tools.remember("still works").await, "still works");
        assert!(tools.complete(false, "device lost").await);
    }
}
