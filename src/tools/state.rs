//! Device state snapshots and screenshots.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Screen rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Create new bounds.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Centre point, used as the tap target.
    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    /// True when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }
}

/// An addressable on-screen element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UiElement {
    /// Element index, valid for the snapshot it came from only.
    pub index: usize,
    pub class_name: String,
    pub text: String,
    pub resource_id: String,
    pub content_desc: String,
    pub bounds: Bounds,
    pub clickable: bool,
    pub focused: bool,
}

impl UiElement {
    /// Best human-readable label: text, then content description, then resource id.
    pub fn label(&self) -> &str {
        [&self.text, &self.content_desc, &self.resource_id]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Short class name without the package path (e.g. `Button`).
    pub fn short_class(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }
}

/// Non-UI device state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhoneState {
    /// Foreground app as the driver identifies it. ADB and mock drivers report the package id.
    pub current_app: Option<String>,
    /// Package of the foreground app.
    pub package: Option<String>,
    /// Whether the soft keyboard is shown.
    pub keyboard_visible: bool,
    /// Label of the focused element, if any.
    pub focused_element: Option<String>,
}

/// Snapshot returned by `get_state`.
///
/// `elements[i].index == i` for every element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub phone_state: PhoneState,
    pub elements: Vec<UiElement>,
}

impl DeviceState {
    /// Build a snapshot, renumbering elements so indices match positions.
    pub fn new(phone_state: PhoneState, elements: Vec<UiElement>) -> Self {
        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(index, mut element)| {
                element.index = index;
                element
            })
            .collect();
        Self {
            phone_state,
            elements,
        }
    }

    /// Resolve an element index against this snapshot.
    pub fn element(&self, index: usize) -> Option<&UiElement> {
        self.elements.get(index)
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when no element is addressable.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// One line per element, suitable for a prompt.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if let Some(ref pkg) = self.phone_state.package {
            out.push_str(&format!("App: {}\n", pkg));
        }
        out.push_str(&format!(
            "Keyboard: {}\n",
            if self.phone_state.keyboard_visible {
                "visible"
            } else {
                "hidden"
            }
        ));
        for element in &self.elements {
            let (x, y) = element.bounds.center();
            out.push_str(&format!(
                "{}. {}: \"{}\" - ({},{})\n",
                element.index,
                element.short_class(),
                element.label(),
                x,
                y
            ));
        }
        out
    }
}

/// A captured screen image.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    /// Identifier / description of this capture.
    pub id: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    /// Raw encoded image bytes.
    pub data: Vec<u8>,
}

impl Screenshot {
    /// Create a PNG screenshot.
    pub fn png(id: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            mime: "image/png".to_string(),
            width,
            height,
            data,
        }
    }

    /// The `(id, bytes)` pair of the tool contract.
    pub fn into_pair(self) -> (String, Vec<u8>) {
        (self.id, self.data)
    }

    /// JSON form with a base64 payload.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "mime": self.mime,
            "width": self.width,
            "height": self.height,
            "size_bytes": self.data.len(),
            "data_b64": STANDARD.encode(&self.data),
        })
    }
}
