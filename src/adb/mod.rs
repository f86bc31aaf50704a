//! ADB (Android Debug Bridge) driver for the [`Tools`](crate::Tools) contract.

mod connection;
pub mod device;
pub mod input;
mod screenshot;
mod tools;
pub mod ui;

pub use connection::{AdbConnection, AdbError, ConnectionType, DeviceInfo};
pub use screenshot::{get_screenshot, ScreenshotError};
pub use tools::AdbTools;
pub use ui::{parse_hierarchy, UiDump};
