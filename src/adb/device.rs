//! Device control commands for Android automation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::connection::{AdbConnection, AdbError};

/// Key code of the system back button.
pub const KEYCODE_BACK: i32 = 4;

static FOCUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:mCurrentFocus|mFocusedApp)=.*?\s([A-Za-z][\w.]*)/").unwrap()
});

/// Tap at the specified coordinates.
pub async fn tap(conn: &AdbConnection, x: i32, y: i32) -> Result<(), AdbError> {
    conn.shell(&["input", "tap", &x.to_string(), &y.to_string()])
        .await
        .map(|_| ())
}

/// Swipe from start to end coordinates over `duration_ms`.
pub async fn swipe(
    conn: &AdbConnection,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    duration_ms: u64,
) -> Result<(), AdbError> {
    conn.shell(&[
        "input",
        "swipe",
        &start_x.to_string(),
        &start_y.to_string(),
        &end_x.to_string(),
        &end_y.to_string(),
        &duration_ms.to_string(),
    ])
    .await
    .map(|_| ())
}

/// Send a key event.
pub async fn key_event(conn: &AdbConnection, keycode: i32) -> Result<(), AdbError> {
    conn.shell(&["input", "keyevent", &keycode.to_string()])
        .await
        .map(|_| ())
}

/// Press the back button.
pub async fn back(conn: &AdbConnection) -> Result<(), AdbError> {
    key_event(conn, KEYCODE_BACK).await
}

/// Package of the focused window, if one can be determined.
pub async fn current_package(conn: &AdbConnection) -> Result<Option<String>, AdbError> {
    let stdout = conn.shell(&["dumpsys", "window"]).await?;
    Ok(parse_focused_package(&stdout))
}

/// Whether the soft keyboard is currently shown.
pub async fn keyboard_shown(conn: &AdbConnection) -> Result<bool, AdbError> {
    let stdout = conn.shell(&["dumpsys", "input_method"]).await?;
    Ok(stdout.contains("mInputShown=true"))
}

/// Whether a package is installed.
pub async fn package_installed(conn: &AdbConnection, package: &str) -> Result<bool, AdbError> {
    // `pm path` exits non-zero for unknown packages on recent Android versions.
    match conn.shell(&["pm", "path", package]).await {
        Ok(stdout) => Ok(stdout.lines().any(|l| l.trim().starts_with("package:"))),
        Err(AdbError::CommandFailed(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Launch an app. An empty `activity` fires the launcher intent.
pub async fn launch_app(conn: &AdbConnection, package: &str, activity: &str) -> Result<(), AdbError> {
    let stdout = if activity.is_empty() {
        conn.shell(&[
            "monkey",
            "-p",
            package,
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ])
        .await?
    } else {
        let component = component_name(package, activity);
        conn.shell(&["am", "start", "-n", &component]).await?
    };

    if stdout.contains("Error") || stdout.contains("No activities found") {
        return Err(AdbError::CommandFailed(stdout.trim().to_string()));
    }
    Ok(())
}

/// List installed packages; `-3` restricts to third-party apps.
pub async fn list_packages(
    conn: &AdbConnection,
    include_system_apps: bool,
) -> Result<Vec<String>, AdbError> {
    let stdout = if include_system_apps {
        conn.shell(&["pm", "list", "packages"]).await?
    } else {
        conn.shell(&["pm", "list", "packages", "-3"]).await?
    };
    Ok(parse_package_list(&stdout))
}

/// `pkg/activity`, expanding a leading `.` shorthand.
pub(crate) fn component_name(package: &str, activity: &str) -> String {
    if activity.contains('/') {
        activity.to_string()
    } else if activity.starts_with('.') {
        format!("{}/{}{}", package, package, activity)
    } else {
        format!("{}/{}", package, activity)
    }
}

pub(crate) fn parse_focused_package(dumpsys: &str) -> Option<String> {
    dumpsys
        .lines()
        .filter(|line| line.contains("mCurrentFocus") || line.contains("mFocusedApp"))
        .find_map(|line| FOCUS_RE.captures(line))
        .map(|caps| caps[1].to_string())
}

pub(crate) fn parse_package_list(stdout: &str) -> Vec<String> {
    let mut packages: Vec<String> = stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    packages.sort();
    packages.dedup();
    packages
}
