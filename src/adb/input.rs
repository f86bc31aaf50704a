//! Text input through the ADB Keyboard IME.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::connection::{AdbConnection, AdbError};

/// IME id of ADB Keyboard.
pub const ADB_KEYBOARD_IME: &str = "com.android.adbkeyboard/.AdbIME";

/// Type text into the currently focused input field.
///
/// Requires ADB Keyboard to be installed and active on the device.
/// See: https://github.com/senzhk/ADBKeyBoard
///
/// Empty text sends nothing: `adb shell` drops an empty argument, which
/// would leave `--es msg` without a value.
pub async fn type_text(conn: &AdbConnection, text: &str) -> Result<(), AdbError> {
    if text.is_empty() {
        return Ok(());
    }
    let encoded_text = STANDARD.encode(text.as_bytes());
    let stdout = conn
        .shell(&[
            "am",
            "broadcast",
            "-a",
            "ADB_INPUT_B64",
            "--es",
            "msg",
            &encoded_text,
        ])
        .await?;
    check_broadcast(&stdout)
}

/// Clear text in the currently focused input field.
pub async fn clear_text(conn: &AdbConnection) -> Result<(), AdbError> {
    let stdout = conn
        .shell(&["am", "broadcast", "-a", "ADB_CLEAR_TEXT"])
        .await?;
    check_broadcast(&stdout)
}

/// Switch to ADB Keyboard if needed and return the previous IME id.
pub async fn detect_and_set_adb_keyboard(conn: &AdbConnection) -> Result<String, AdbError> {
    let current_ime = conn
        .shell(&["settings", "get", "secure", "default_input_method"])
        .await?
        .trim()
        .to_string();

    if !current_ime.contains(ADB_KEYBOARD_IME) {
        conn.shell(&["ime", "set", ADB_KEYBOARD_IME]).await?;
    }

    Ok(current_ime)
}

/// Restore a previously active IME.
pub async fn restore_keyboard(conn: &AdbConnection, ime: &str) -> Result<(), AdbError> {
    if ime.is_empty() || ime.contains(ADB_KEYBOARD_IME) || ime == "null" {
        return Ok(());
    }
    conn.shell(&["ime", "set", ime]).await.map(|_| ())
}

fn check_broadcast(stdout: &str) -> Result<(), AdbError> {
    if stdout.contains("Broadcast completed") || stdout.trim().is_empty() {
        Ok(())
    } else {
        Err(AdbError::CommandFailed(stdout.trim().to_string()))
    }
}
