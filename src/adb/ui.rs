//! Element extraction from `uiautomator dump` output.
//!
//! Only interactive nodes with a visible area get an index. Nodes are
//! numbered in document order, which is stable for an unchanged screen.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::{Bounds, UiElement};

static NODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<node\s([^>]*?)/?>").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).unwrap());
static BOUNDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").unwrap());

/// Parsed hierarchy dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiDump {
    /// Indexed interactive elements.
    pub elements: Vec<UiElement>,
    /// Package of the root window.
    pub package: Option<String>,
    /// Label of the node holding input focus.
    pub focused: Option<String>,
}

/// Parse a `uiautomator dump` XML document.
pub fn parse_hierarchy(xml: &str) -> UiDump {
    let mut dump = UiDump::default();

    for caps in NODE_RE.captures_iter(xml) {
        let mut node = RawNode::default();
        for attr in ATTR_RE.captures_iter(&caps[1]) {
            node.set(&attr[1], unescape(&attr[2]));
        }

        if dump.package.is_none() && !node.package.is_empty() {
            dump.package = Some(node.package.clone());
        }

        let bounds = match parse_bounds(&node.bounds) {
            Some(b) if !b.is_empty() => b,
            _ => continue,
        };

        let element = UiElement {
            index: dump.elements.len(),
            class_name: node.class_name,
            text: node.text,
            resource_id: node.resource_id,
            content_desc: node.content_desc,
            bounds,
            clickable: node.clickable,
            focused: node.focused,
        };

        if element.focused && dump.focused.is_none() {
            dump.focused = Some(element.label().to_string());
        }
        if node.interactive || element.class_name.ends_with("EditText") {
            dump.elements.push(element);
        }
    }

    dump
}

#[derive(Default)]
struct RawNode {
    class_name: String,
    text: String,
    resource_id: String,
    content_desc: String,
    package: String,
    bounds: String,
    clickable: bool,
    focused: bool,
    interactive: bool,
}

impl RawNode {
    fn set(&mut self, key: &str, value: String) {
        let flag = value == "true";
        match key {
            "class" => self.class_name = value,
            "text" => self.text = value,
            "resource-id" => self.resource_id = value,
            "content-desc" => self.content_desc = value,
            "package" => self.package = value,
            "bounds" => self.bounds = value,
            "clickable" => {
                self.clickable = flag;
                self.interactive |= flag;
            }
            "long-clickable" | "checkable" | "scrollable" => self.interactive |= flag,
            "focused" => self.focused = flag,
            _ => {}
        }
    }
}

fn parse_bounds(raw: &str) -> Option<Bounds> {
    let caps = BOUNDS_RE.captures(raw)?;
    let n = |i: usize| caps[i].parse::<i32>().ok();
    Some(Bounds::new(n(1)?, n(2)?, n(3)?, n(4)?))
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#10;", "\n")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><hierarchy rotation="0"><node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="false" enabled="true" focusable="false" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[0,0][1080,2400]"><node index="0" text="Search settings" resource-id="com.android.settings:id/search_action_bar" class="android.widget.TextView" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="true" enabled="true" focusable="true" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[42,150][1038,282]" /><node index="1" text="" resource-id="com.android.settings:id/list" class="androidx.recyclerview.widget.RecyclerView" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="false" enabled="true" focusable="true" focused="false" scrollable="true" long-clickable="false" password="false" selected="false" bounds="[0,300][1080,2400]"><node index="0" text="Network &amp; internet" resource-id="android:id/title" class="android.widget.TextView" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="false" enabled="true" focusable="false" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[189,340][640,400]" /><node index="1" text="" resource-id="" class="android.widget.LinearLayout" package="com.android.settings" content-desc="Wi-Fi" checkable="false" checked="false" clickable="true" enabled="true" focusable="true" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[0,420][1080,560]" /><node index="2" text="" resource-id="com.android.settings:id/query" class="android.widget.EditText" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="false" enabled="true" focusable="true" focused="true" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[0,600][1080,700]" /><node index="3" text="Hidden" resource-id="" class="android.widget.Button" package="com.android.settings" content-desc="" checkable="false" checked="false" clickable="true" enabled="true" focusable="true" focused="false" scrollable="false" long-clickable="false" password="false" selected="false" bounds="[0,0][0,0]" /></node></node></hierarchy>"#;

    #[test]
    fn test_parse_hierarchy() {
        let dump = parse_hierarchy(DUMP);
        assert_eq!(dump.package.as_deref(), Some("com.android.settings"));

        let labels: Vec<&str> = dump.elements.iter().map(|e| e.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Search settings",
                "com.android.settings:id/list",
                "Wi-Fi",
                "com.android.settings:id/query"
            ]
        );
        for (i, element) in dump.elements.iter().enumerate() {
            assert_eq!(element.index, i);
        }
        assert_eq!(dump.elements[0].bounds, Bounds::new(42, 150, 1038, 282));
        assert!(dump.elements[0].clickable);
        assert!(!dump.elements[1].clickable);
    }

    #[test]
    fn test_focused_node() {
        let dump = parse_hierarchy(DUMP);
        assert_eq!(dump.focused.as_deref(), Some("com.android.settings:id/query"));
        assert!(dump.elements[3].focused);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("Network &amp; internet"), "Network & internet");
        assert_eq!(unescape("&lt;b&gt; &quot;x&quot;"), "<b> \"x\"");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_empty_dump() {
        let dump = parse_hierarchy("<hierarchy rotation=\"0\"></hierarchy>");
        assert!(dump.elements.is_empty());
        assert!(dump.package.is_none());
    }
}
