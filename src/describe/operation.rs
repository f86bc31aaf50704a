//! Static metadata for the base operation set.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::tools::DEFAULT_SWIPE_DURATION_MS;

/// The base operations every driver may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetState,
    TapByIndex,
    Swipe,
    InputText,
    Back,
    PressKey,
    StartApp,
    TakeScreenshot,
    ListPackages,
    Remember,
    GetMemory,
    Complete,
}

impl Operation {
    /// All base operations in declaration order.
    pub const ALL: [Operation; 12] = [
        Operation::GetState,
        Operation::TapByIndex,
        Operation::Swipe,
        Operation::InputText,
        Operation::Back,
        Operation::PressKey,
        Operation::StartApp,
        Operation::TakeScreenshot,
        Operation::ListPackages,
        Operation::Remember,
        Operation::GetMemory,
        Operation::Complete,
    ];

    /// Name the operation is advertised and invoked under.
    pub fn name(self) -> &'static str {
        match self {
            Operation::GetState => "get_state",
            Operation::TapByIndex => "tap_by_index",
            Operation::Swipe => "swipe",
            Operation::InputText => "input_text",
            Operation::Back => "back",
            Operation::PressKey => "press_key",
            Operation::StartApp => "start_app",
            Operation::TakeScreenshot => "take_screenshot",
            Operation::ListPackages => "list_packages",
            Operation::Remember => "remember",
            Operation::GetMemory => "get_memory",
            Operation::Complete => "complete",
        }
    }

    /// Look up a base operation by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::GetState => {
                "Get the current device state: foreground app, keyboard visibility and the indexed list of interactive UI elements. Call this before tapping a newly seen element."
            }
            Operation::TapByIndex => {
                "Tap the UI element with the given index from the most recent state. Returns false if the index is not valid any more."
            }
            Operation::Swipe => "Swipe from (start_x, start_y) to (end_x, end_y) in screen pixels.",
            Operation::InputText => "Type text into the currently focused input field.",
            Operation::Back => "Press the Android back button.",
            Operation::PressKey => {
                "Press a key by Android key code (e.g. 3 = HOME, 4 = BACK, 66 = ENTER) or KEYCODE_* name."
            }
            Operation::StartApp => {
                "Launch an app by package name, optionally at a specific activity."
            }
            Operation::TakeScreenshot => "Capture a PNG screenshot of the current screen.",
            Operation::ListPackages => "List installed package names.",
            Operation::Remember => {
                "Remember an important piece of information for later steps. Returns the stored text."
            }
            Operation::GetMemory => "Return all remembered information, oldest first.",
            Operation::Complete => {
                "Mark the task as finished, successfully or not, with an optional reason."
            }
        }
    }

    /// Parameters in positional order.
    pub fn params(self) -> Vec<ParamSpec> {
        match self {
            Operation::GetState
            | Operation::Back
            | Operation::TakeScreenshot
            | Operation::GetMemory => Vec::new(),
            Operation::TapByIndex => vec![ParamSpec::required(
                "index",
                ParamKind::Integer,
                "Element index from the latest state",
            )],
            Operation::Swipe => vec![
                ParamSpec::required("start_x", ParamKind::Integer, "Start X coordinate"),
                ParamSpec::required("start_y", ParamKind::Integer, "Start Y coordinate"),
                ParamSpec::required("end_x", ParamKind::Integer, "End X coordinate"),
                ParamSpec::required("end_y", ParamKind::Integer, "End Y coordinate"),
                ParamSpec::optional(
                    "duration_ms",
                    ParamKind::Integer,
                    "Gesture duration in milliseconds",
                    json!(DEFAULT_SWIPE_DURATION_MS),
                ),
            ],
            Operation::InputText => vec![ParamSpec::required(
                "text",
                ParamKind::String,
                "Text to type",
            )],
            Operation::PressKey => vec![ParamSpec::required(
                "keycode",
                ParamKind::KeyCode,
                "Android key code, or a KEYCODE_* name",
            )],
            Operation::StartApp => vec![
                ParamSpec::required("package", ParamKind::String, "Package name"),
                ParamSpec::optional(
                    "activity",
                    ParamKind::String,
                    "Activity to start; empty launches the default one",
                    json!(""),
                ),
            ],
            Operation::ListPackages => vec![ParamSpec::optional(
                "include_system_apps",
                ParamKind::Boolean,
                "Include system packages",
                json!(false),
            )],
            Operation::Remember => vec![ParamSpec::required(
                "information",
                ParamKind::String,
                "Text to remember",
            )],
            Operation::Complete => vec![
                ParamSpec::required("success", ParamKind::Boolean, "Whether the task succeeded"),
                ParamSpec::optional(
                    "reason",
                    ParamKind::String,
                    "Why the task finished",
                    json!(""),
                ),
            ],
        }
    }

    /// Descriptor entry for this operation.
    pub fn capability(self) -> Capability {
        Capability {
            name: self.name().to_string(),
            description: self.description().to_string(),
            params: self.params(),
            target: Target::Builtin(self),
        }
    }
}

/// JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Integer,
    Number,
    String,
    Boolean,
    /// Integer key code or `KEYCODE_*` name; bound to an integer.
    KeyCode,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::String => "string",
            ParamKind::Boolean => "boolean",
            ParamKind::KeyCode => "integer | string",
        }
    }

    /// `type` value of the JSON schema.
    pub fn schema_type(self) -> Value {
        match self {
            ParamKind::KeyCode => json!(["integer", "string"]),
            other => json!(other.json_type()),
        }
    }
}

/// One parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// What invoking a capability runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A base trait method.
    Builtin(Operation),
    /// Routed to `Tools::invoke_extension`.
    Extension,
}

/// A descriptor entry: name, documentation, parameters and invocation target.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub target: Target,
}

impl Capability {
    /// Declare an operation provided by a driver on top of the base set.
    pub fn extension(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
            target: Target::Extension,
        }
    }

    /// Replace the advertised default of one parameter.
    ///
    /// Binding fills the new default, so it is also what dispatch receives.
    pub fn with_default(mut self, param: &str, default: Value) -> Self {
        if let Some(spec) = self.params.iter_mut().find(|p| p.name == param) {
            spec.default = Some(default);
        }
        self
    }

    /// Python-like signature line, e.g. `swipe(start_x: integer, ..., duration_ms: integer = 300)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}: {} = {}", p.name, p.kind.json_type(), default),
                None => format!("{}: {}", p.name, p.kind.json_type()),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// JSON schema of the accepted keyword arguments.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.kind.schema_type(),
                "description": param.description,
            });
            if let Some(ref default) = param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// OpenAI-compatible function-calling definition.
    pub fn function_definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}
