//! ADB process management for local and remote devices.

use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

use crate::tools::ToolsError;

/// Type of ADB connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionType {
    Usb,
    Tcp,
    Emulator,
}

/// Information about a connected device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_id: String,
    pub status: String,
    pub connection_type: ConnectionType,
    pub model: Option<String>,
}

impl DeviceInfo {
    /// Whether the device accepts commands.
    pub fn is_online(&self) -> bool {
        self.status == "device"
    }
}

/// ADB errors.
#[derive(Error, Debug)]
pub enum AdbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Command execution failed: {0}")]
    CommandFailed(String),
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
}

impl From<AdbError> for ToolsError {
    fn from(err: AdbError) -> Self {
        ToolsError::DeviceUnavailable(err.to_string())
    }
}

/// Handle to one device (or the default device) through the `adb` binary.
///
/// # Example
/// ```rust,no_run
/// use droid_tools::adb::AdbConnection;
///
/// # async fn demo() -> Result<(), droid_tools::adb::AdbError> {
/// let conn = AdbConnection::new().with_device("192.168.1.100:5555");
/// conn.connect("192.168.1.100:5555").await?;
/// let devices = conn.list_devices().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdbConnection {
    adb_path: String,
    device_id: Option<String>,
}

impl Default for AdbConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl AdbConnection {
    /// Use `adb` from `PATH` and the default device.
    pub fn new() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_id: None,
        }
    }

    /// Use a custom ADB binary.
    pub fn with_path(mut self, adb_path: impl Into<String>) -> Self {
        self.adb_path = adb_path.into();
        self
    }

    /// Target a specific device serial.
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn adb_path(&self) -> &str {
        &self.adb_path
    }

    /// Run `adb [-s serial] <args>` and fail on a non-zero exit status.
    pub async fn run(&self, args: &[&str]) -> Result<Output, AdbError> {
        let prefix = get_adb_prefix(&self.adb_path, self.device_id.as_deref());
        let output = Command::new(&prefix[0])
            .args(&prefix[1..])
            .args(args)
            .output()
            .await
            .map_err(|e| AdbError::Connection(format!("{}: {}", self.adb_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(stderr, self.device_id.as_deref()));
        }
        Ok(output)
    }

    /// Run a shell command on the device and return its stdout.
    pub async fn shell(&self, args: &[&str]) -> Result<String, AdbError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        let output = self.run(&full).await?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run `exec-out` and return raw stdout and stderr.
    pub async fn exec_out(&self, args: &[&str]) -> Result<(Vec<u8>, String), AdbError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("exec-out");
        full.extend_from_slice(args);
        let output = self.run(&full).await?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Ok((output.stdout, stderr))
    }

    /// Connect to a remote device via TCP/IP.
    ///
    /// `address` is `host[:port]`; port 5555 is assumed when missing.
    pub async fn connect(&self, address: &str) -> Result<String, AdbError> {
        let address = if !address.contains(':') {
            format!("{}:5555", address)
        } else {
            address.to_string()
        };

        let output = Command::new(&self.adb_path)
            .args(["connect", &address])
            .output()
            .await
            .map_err(|e| AdbError::Connection(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{}{}", stdout, stderr).to_lowercase();

        // "failed to connect" also contains "connect", so check for it first.
        if combined.contains("failed") || combined.contains("unable") {
            Err(AdbError::Connection(combined.trim().to_string()))
        } else if combined.contains("connected") {
            Ok(format!("Connected to {}", address))
        } else {
            Err(AdbError::Connection(combined.trim().to_string()))
        }
    }

    /// Disconnect from a remote device, or from all when `address` is `None`.
    pub async fn disconnect(&self, address: Option<&str>) -> Result<String, AdbError> {
        let args: Vec<&str> = match address {
            Some(addr) => vec!["disconnect", addr],
            None => vec!["disconnect"],
        };

        let output = Command::new(&self.adb_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| AdbError::Connection(e.to_string()))?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// List all attached devices.
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, AdbError> {
        let output = Command::new(&self.adb_path)
            .args(["devices", "-l"])
            .output()
            .await
            .map_err(|e| AdbError::CommandFailed(e.to_string()))?;

        Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Check the configured device is attached and online.
    pub async fn ensure_online(&self) -> Result<(), AdbError> {
        let devices = self.list_devices().await?;
        let online = match self.device_id.as_deref() {
            Some(id) => devices.iter().any(|d| d.device_id == id && d.is_online()),
            None => devices.iter().any(DeviceInfo::is_online),
        };
        if online {
            Ok(())
        } else {
            Err(AdbError::DeviceNotFound(
                self.device_id
                    .clone()
                    .unwrap_or_else(|| "no online device".to_string()),
            ))
        }
    }

    /// Start ADB server.
    pub async fn start_server(&self) -> Result<(), AdbError> {
        Command::new(&self.adb_path)
            .args(["start-server"])
            .output()
            .await
            .map_err(|e| AdbError::CommandFailed(e.to_string()))?;
        Ok(())
    }

    /// Kill ADB server.
    pub async fn kill_server(&self) -> Result<(), AdbError> {
        Command::new(&self.adb_path)
            .args(["kill-server"])
            .output()
            .await
            .map_err(|e| AdbError::CommandFailed(e.to_string()))?;
        Ok(())
    }
}

/// `adb` command prefix with optional device specifier.
pub(crate) fn get_adb_prefix(adb_path: &str, device_id: Option<&str>) -> Vec<String> {
    match device_id {
        Some(id) => vec![adb_path.to_string(), "-s".to_string(), id.to_string()],
        None => vec![adb_path.to_string()],
    }
}

fn classify_failure(stderr: String, device_id: Option<&str>) -> AdbError {
    let lower = stderr.to_lowercase();
    if lower.contains("no devices")
        || lower.contains("not found")
        || lower.contains("offline")
        || lower.contains("unauthorized")
    {
        AdbError::DeviceNotFound(match device_id {
            Some(id) => format!("{}: {}", id, stderr),
            None => stderr,
        })
    } else {
        AdbError::CommandFailed(stderr)
    }
}

/// Parse `adb devices -l` output.
pub(crate) fn parse_devices(stdout: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for line in stdout.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        let device_id = parts[0].to_string();
        let connection_type = if device_id.starts_with("emulator-") {
            ConnectionType::Emulator
        } else if device_id.contains(':') {
            ConnectionType::Tcp
        } else {
            ConnectionType::Usb
        };

        let model = parts
            .iter()
            .find_map(|p| p.strip_prefix("model:"))
            .map(|m| m.to_string());

        devices.push(DeviceInfo {
            device_id,
            status: parts[1].to_string(),
            connection_type,
            model,
        });
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adb_connection_new() {
        let conn = AdbConnection::new();
        assert_eq!(conn.adb_path(), "adb");
        assert_eq!(conn.device_id(), None);
    }

    #[test]
    fn test_get_adb_prefix() {
        assert_eq!(get_adb_prefix("adb", None), vec!["adb"]);
        assert_eq!(
            get_adb_prefix("/opt/sdk/adb", Some("device123")),
            vec!["/opt/sdk/adb", "-s", "device123"]
        );
    }

    #[test]
    fn test_parse_devices() {
        let stdout = "List of devices attached\n\
            * daemon started successfully\n\
            R58M123ABC     device usb:1-1 product:a51 model:SM_A515F device:a51\n\
            192.168.1.20:5555 offline\n\
            emulator-5554  device product:sdk_gphone model:sdk_gphone64 device:emu64\n\n";
        let devices = parse_devices(stdout);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].connection_type, ConnectionType::Usb);
        assert_eq!(devices[0].model.as_deref(), Some("SM_A515F"));
        assert!(devices[0].is_online());
        assert_eq!(devices[1].connection_type, ConnectionType::Tcp);
        assert!(!devices[1].is_online());
        assert_eq!(devices[2].connection_type, ConnectionType::Emulator);
    }

    #[test]
    fn test_classify_failure() {
        let err = classify_failure("error: device offline".to_string(), Some("abc"));
        assert!(matches!(err, AdbError::DeviceNotFound(ref msg) if msg.starts_with("abc")));

        let err = classify_failure("Exception occurred".to_string(), None);
        assert!(matches!(err, AdbError::CommandFailed(_)));
    }

    #[test]
    fn test_adb_error_becomes_unavailable() {
        let err: ToolsError = AdbError::DeviceNotFound("abc".to_string()).into();
        assert!(matches!(err, ToolsError::DeviceUnavailable(_)));
    }
}
