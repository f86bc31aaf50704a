//! Droid Tools - device-control toolbox for Android automation agents
//!
//! This is the CLI entry point for the droid-tools binary.
//! Run with: cargo run --bin droid-tools -- <command>

use droid_tools::{
    AdbConnection, AdbTools, Bounds, MockTools, ToolSession, Tools, ToolsSettings, UiElement,
};
use serde_json::Value;
use std::env;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: droid-tools [command]

Commands:
  devices                    List connected devices
  describe                   Print the capability descriptor
  state                      Print the current device state
  screenshot <file>          Save a screenshot as PNG
  call <operation> [json]    Invoke one operation
  (none)                     Interactive mode";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let settings = ToolsSettings::load().with_env_overrides();
    let use_mock = env::var("DROID_TOOLS_MOCK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    if args.first().map(String::as_str) == Some("devices") {
        return list_devices(&settings).await;
    }

    if use_mock {
        run(ToolSession::new(demo_device()), &settings, &args, "Mock").await
    } else {
        let tools = AdbTools::from_settings(&settings);
        run(ToolSession::new(tools), &settings, &args, "ADB").await
    }
}

async fn run<T: Tools>(
    mut session: ToolSession<T>,
    settings: &ToolsSettings,
    args: &[String],
    driver: &str,
) -> anyhow::Result<()> {
    match args.first().map(String::as_str) {
        Some("describe") => {
            println!("{}", serde_json::to_string_pretty(&session.capabilities().to_json())?);
        }
        Some("state") => {
            let state = session.tools_mut().get_state().await?;
            println!("{}", state.summary());
        }
        Some("screenshot") => {
            let Some(path) = args.get(1) else {
                anyhow::bail!("screenshot needs an output file\n\n{}", USAGE);
            };
            let screenshot = session.tools_mut().take_screenshot().await?;
            std::fs::write(path, &screenshot.data)?;
            println!(
                "📸 Saved {} ({}x{}) to {}",
                screenshot.id, screenshot.width, screenshot.height, path
            );
        }
        Some("call") => {
            let Some(operation) = args.get(1) else {
                anyhow::bail!("call needs an operation name\n\n{}", USAGE);
            };
            let json = args[2..].join(" ");
            let result = session.invoke(operation, parse_args(&json)?).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => anyhow::bail!("Unknown command: {}\n\n{}", other, USAGE),
        None => interactive(&mut session, settings, driver).await?,
    }

    Ok(())
}

async fn list_devices(settings: &ToolsSettings) -> anyhow::Result<()> {
    let conn = AdbConnection::new().with_path(&settings.adb_path);
    let devices = conn.list_devices().await?;

    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }
    for device in devices {
        println!(
            "{}\t{}\t{:?}\t{}",
            device.device_id,
            device.status,
            device.connection_type,
            device.model.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Read `<operation> [json-args]` lines until quit or task completion.
async fn interactive<T: Tools>(
    session: &mut ToolSession<T>,
    settings: &ToolsSettings,
    driver: &str,
) -> anyhow::Result<()> {
    println!("🤖 Droid Tools - Android device toolbox");
    println!("================================================");
    println!("Driver: {}", driver);
    println!("ADB: {}", settings.adb_path);
    if let Some(id) = settings.device() {
        println!("Device: {}", id);
    }
    println!("Operations: {}", session.capabilities().names().join(", "));
    println!("================================================\n");
    println!("Type '<operation> [json-args]' and press Enter.");
    println!("Type 'quit' or 'exit' to exit.\n");

    session.begin_task();
    let stdin = io::stdin();
    loop {
        print!("🔧 > ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "exit" {
            println!("Goodbye! 👋");
            break;
        }

        let (operation, json) = input.split_once(' ').unwrap_or((input, ""));
        let args = match parse_args(json) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("❌ {}\n", e);
                continue;
            }
        };

        match session.invoke(operation, args).await {
            Ok(Value::String(text)) => println!("✅ {}\n", text),
            Ok(result) => println!("✅ {}\n", serde_json::to_string_pretty(&result)?),
            Err(e) => eprintln!("❌ Error: {}\n", e),
        }

        if let Some((success, reason)) = session.outcome() {
            let mark = if success { "✅" } else { "❌" };
            println!("{} Task finished: {}", mark, reason);
            println!("Steps: {}", session.trajectory().len());
            let memory = session.tools().memory().render();
            if !memory.is_empty() {
                println!("\n{}", memory);
            }
            break;
        }
    }

    Ok(())
}

fn parse_args(json: &str) -> anyhow::Result<Value> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(json).map_err(|e| anyhow::anyhow!("Invalid JSON arguments: {}", e))
}

/// Simulated device used when `DROID_TOOLS_MOCK` is set.
fn demo_device() -> MockTools {
    let element = |class: &str, text: &str, desc: &str, top: i32| UiElement {
        class_name: class.to_string(),
        text: text.to_string(),
        content_desc: desc.to_string(),
        bounds: Bounds::new(0, top, 540, top + 120),
        clickable: true,
        ..Default::default()
    };

    MockTools::new()
        .with_elements(vec![
            element("android.widget.TextView", "Search settings", "", 100),
            element("android.widget.LinearLayout", "", "Wi-Fi", 240),
            element("android.widget.LinearLayout", "Bluetooth", "", 380),
            element("android.widget.EditText", "", "Search", 520),
        ])
        .with_package("com.android.settings", true)
        .with_package("com.android.chrome", false)
        .with_package("com.example.notes", false)
        .with_focused_field(true)
}
