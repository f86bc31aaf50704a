//! Binding JSON arguments to operations and dispatching them.

use serde::Serialize;
use serde_json::{Map, Value};

use super::operation::{Capability, Operation, ParamKind, ParamSpec, Target};
use crate::config::keycode_for;
use crate::tools::{Tools, ToolsError};

/// Bind keyword (object), positional (array) or empty (null) arguments.
///
/// Fills defaults and type-checks every parameter. The result is keyed by
/// parameter name in declaration order.
pub fn bind_args(capability: &Capability, args: Value) -> Result<Map<String, Value>, ToolsError> {
    let mut bound = Map::new();

    match args {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                if !capability.params.iter().any(|p| p.name == key) {
                    return Err(ToolsError::InvalidArgument(format!(
                        "{} got an unexpected argument '{}'",
                        capability.name, key
                    )));
                }
                bound.insert(key, value);
            }
        }
        Value::Array(values) => {
            if values.len() > capability.params.len() {
                return Err(ToolsError::InvalidArgument(format!(
                    "{} takes at most {} arguments, got {}",
                    capability.name,
                    capability.params.len(),
                    values.len()
                )));
            }
            for (param, value) in capability.params.iter().zip(values) {
                bound.insert(param.name.clone(), value);
            }
        }
        other => {
            return Err(ToolsError::InvalidArgument(format!(
                "{} arguments must be an object or an array, got {}",
                capability.name, other
            )));
        }
    }

    let mut ordered = Map::new();
    for param in &capability.params {
        let value = match bound.remove(&param.name) {
            Some(Value::Null) | None => match &param.default {
                Some(default) => default.clone(),
                None if param.required => {
                    return Err(ToolsError::InvalidArgument(format!(
                        "{} missing required argument '{}'",
                        capability.name, param.name
                    )));
                }
                None => continue,
            },
            Some(value) => value,
        };
        let value = normalize(capability, param, value)?;
        check_kind(capability, param, &value)?;
        ordered.insert(param.name.clone(), value);
    }

    Ok(ordered)
}

/// Resolve `KEYCODE_*` names for key code parameters.
fn normalize(capability: &Capability, param: &ParamSpec, value: Value) -> Result<Value, ToolsError> {
    if param.kind != ParamKind::KeyCode {
        return Ok(value);
    }
    match value {
        Value::String(name) => keycode_for(&name).map(Value::from).ok_or_else(|| {
            ToolsError::InvalidArgument(format!(
                "{} got unknown key name '{}' for '{}'",
                capability.name, name, param.name
            ))
        }),
        other => Ok(other),
    }
}

fn check_kind(capability: &Capability, param: &ParamSpec, value: &Value) -> Result<(), ToolsError> {
    let ok = match param.kind {
        ParamKind::Integer | ParamKind::KeyCode => value.is_i64() || value.is_u64(),
        ParamKind::Number => value.is_number(),
        ParamKind::String => value.is_string(),
        ParamKind::Boolean => value.is_boolean(),
    };
    if ok {
        Ok(())
    } else {
        Err(ToolsError::InvalidArgument(format!(
            "{} argument '{}' must be {}, got {}",
            capability.name,
            param.name,
            param.kind.json_type(),
            value
        )))
    }
}

fn int_arg(args: &Map<String, Value>, name: &str) -> i64 {
    args.get(name)
        .and_then(|v| v.as_i64().or_else(|| v.as_u64().map(|u| u.min(i64::MAX as u64) as i64)))
        .unwrap_or_default()
}

fn coord_arg(args: &Map<String, Value>, name: &str) -> Result<i32, ToolsError> {
    let raw = int_arg(args, name);
    i32::try_from(raw).map_err(|_| {
        ToolsError::InvalidArgument(format!("coordinate '{}' out of range: {}", name, raw))
    })
}

fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

fn bool_arg(args: &Map<String, Value>, name: &str) -> bool {
    args.get(name).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn to_json<S: Serialize>(value: &S) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize operation result: {}", e);
        Value::Null
    })
}

/// Run a bound capability against a tools instance.
pub async fn dispatch<T: Tools + ?Sized>(
    tools: &mut T,
    capability: &Capability,
    args: Map<String, Value>,
) -> Result<Value, ToolsError> {
    let operation = match capability.target {
        Target::Builtin(op) => op,
        Target::Extension => {
            return tools
                .invoke_extension(&capability.name, Value::Object(args))
                .await;
        }
    };

    let result = match operation {
        Operation::GetState => to_json(&tools.get_state().await?),
        Operation::TapByIndex => {
            // Negative indices are simply out of range.
            let delivered = match usize::try_from(int_arg(&args, "index")) {
                Ok(index) => tools.tap_by_index(index).await,
                Err(_) => false,
            };
            Value::Bool(delivered)
        }
        Operation::Swipe => {
            let duration = int_arg(&args, "duration_ms");
            let delivered = if duration <= 0 {
                false
            } else {
                tools
                    .swipe(
                        coord_arg(&args, "start_x")?,
                        coord_arg(&args, "start_y")?,
                        coord_arg(&args, "end_x")?,
                        coord_arg(&args, "end_y")?,
                        duration as u64,
                    )
                    .await
            };
            Value::Bool(delivered)
        }
        Operation::InputText => Value::Bool(tools.input_text(str_arg(&args, "text")).await),
        Operation::Back => Value::Bool(tools.back().await),
        Operation::PressKey => {
            let delivered = match i32::try_from(int_arg(&args, "keycode")) {
                Ok(code) => tools.press_key(code).await,
                Err(_) => false,
            };
            Value::Bool(delivered)
        }
        Operation::StartApp => Value::Bool(
            tools
                .start_app(str_arg(&args, "package"), str_arg(&args, "activity"))
                .await,
        ),
        Operation::TakeScreenshot => tools.take_screenshot().await?.to_json(),
        Operation::ListPackages => {
            to_json(&tools.list_packages(bool_arg(&args, "include_system_apps")).await?)
        }
        Operation::Remember => Value::String(tools.remember(str_arg(&args, "information")).await),
        Operation::GetMemory => to_json(&tools.get_memory().await),
        Operation::Complete => Value::Bool(
            tools
                .complete(bool_arg(&args, "success"), str_arg(&args, "reason"))
                .await,
        ),
    };

    Ok(result)
}
