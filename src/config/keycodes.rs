//! Android key code table for `press_key`.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Highest key code defined by the platform (`KEYCODE_MACRO_4`).
pub const MAX_KEYCODE: i32 = 316;

/// Mapping from `KEYCODE_*` names to Android key codes.
pub static KEYCODES: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Navigation
    m.insert("KEYCODE_HOME", 3);
    m.insert("KEYCODE_BACK", 4);
    m.insert("KEYCODE_DPAD_UP", 19);
    m.insert("KEYCODE_DPAD_DOWN", 20);
    m.insert("KEYCODE_DPAD_LEFT", 21);
    m.insert("KEYCODE_DPAD_RIGHT", 22);
    m.insert("KEYCODE_DPAD_CENTER", 23);
    m.insert("KEYCODE_APP_SWITCH", 187);
    m.insert("KEYCODE_MENU", 82);
    m.insert("KEYCODE_SEARCH", 84);

    // Telephony
    m.insert("KEYCODE_CALL", 5);
    m.insert("KEYCODE_ENDCALL", 6);

    // Hardware buttons
    m.insert("KEYCODE_VOLUME_UP", 24);
    m.insert("KEYCODE_VOLUME_DOWN", 25);
    m.insert("KEYCODE_POWER", 26);
    m.insert("KEYCODE_CAMERA", 27);
    m.insert("KEYCODE_VOLUME_MUTE", 164);
    m.insert("KEYCODE_WAKEUP", 224);
    m.insert("KEYCODE_SLEEP", 223);

    // Editing
    m.insert("KEYCODE_TAB", 61);
    m.insert("KEYCODE_SPACE", 62);
    m.insert("KEYCODE_ENTER", 66);
    m.insert("KEYCODE_DEL", 67);
    m.insert("KEYCODE_FORWARD_DEL", 112);
    m.insert("KEYCODE_ESCAPE", 111);
    m.insert("KEYCODE_MOVE_HOME", 122);
    m.insert("KEYCODE_MOVE_END", 123);
    m.insert("KEYCODE_PAGE_UP", 92);
    m.insert("KEYCODE_PAGE_DOWN", 93);
    m.insert("KEYCODE_COPY", 278);
    m.insert("KEYCODE_PASTE", 279);
    m.insert("KEYCODE_CUT", 277);

    // Media
    m.insert("KEYCODE_MEDIA_PLAY_PAUSE", 85);
    m.insert("KEYCODE_MEDIA_STOP", 86);
    m.insert("KEYCODE_MEDIA_NEXT", 87);
    m.insert("KEYCODE_MEDIA_PREVIOUS", 88);

    m
});

/// Resolve a key name. The `KEYCODE_` prefix and case are optional.
pub fn keycode_for(name: &str) -> Option<i32> {
    let upper = name.trim().to_uppercase();
    if let Some(code) = KEYCODES.get(upper.as_str()) {
        return Some(*code);
    }
    KEYCODES.get(format!("KEYCODE_{}", upper).as_str()).copied()
}

/// Whether `code` is a real key code (`KEYCODE_UNKNOWN` excluded).
pub fn is_valid_keycode(code: i32) -> bool {
    (1..=MAX_KEYCODE).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycode_for() {
        assert_eq!(keycode_for("KEYCODE_HOME"), Some(3));
        assert_eq!(keycode_for("enter"), Some(66));
        assert_eq!(keycode_for(" keycode_back "), Some(4));
        assert_eq!(keycode_for("KEYCODE_TELEPORT"), None);
    }

    #[test]
    fn test_valid_range() {
        assert!(is_valid_keycode(4));
        assert!(is_valid_keycode(MAX_KEYCODE));
        assert!(!is_valid_keycode(0));
        assert!(!is_valid_keycode(-1));
        assert!(!is_valid_keycode(MAX_KEYCODE + 1));
        assert!(KEYCODES.values().all(|c| is_valid_keycode(*c)));
    }
}
