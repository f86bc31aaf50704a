//! Static configuration tables.

mod keycodes;

pub use keycodes::{is_valid_keycode, keycode_for, KEYCODES, MAX_KEYCODE};
