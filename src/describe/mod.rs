//! Capability descriptor for a tools instance.
//!
//! [`describe_tools`] builds an ordered map from operation name to a
//! [`Capability`] (documentation, parameter schema and invocation target).
//! The map is rebuilt on every call since a driver may add or override
//! operations; building it never touches the device.

mod invoke;
mod operation;

pub use invoke::{bind_args, dispatch};
pub use operation::{Capability, Operation, ParamKind, ParamSpec, Target};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::tools::{Tools, ToolsError};

/// Ordered `name -> capability` map with unique keys.
#[derive(Debug, Clone, Default)]
pub struct CapabilityMap {
    entries: IndexMap<String, Capability>,
}

impl CapabilityMap {
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Operation names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capability)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Function-calling definitions for every capability.
    pub fn function_definitions(&self) -> Vec<Value> {
        self.entries
            .values()
            .map(Capability::function_definition)
            .collect()
    }

    /// `name -> {signature, description, parameters}` as JSON.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, cap) in &self.entries {
            out.insert(
                name.clone(),
                json!({
                    "signature": cap.signature(),
                    "description": cap.description,
                    "parameters": cap.parameters_schema(),
                }),
            );
        }
        Value::Object(out)
    }

    /// Invoke an operation by name with keyword, positional or no arguments.
    pub async fn invoke<T: Tools + ?Sized>(
        &self,
        tools: &mut T,
        name: &str,
        args: Value,
    ) -> Result<Value, ToolsError> {
        let capability = self
            .get(name)
            .ok_or_else(|| ToolsError::UnknownOperation(name.to_string()))?;
        let bound = bind_args(capability, args)?;
        tracing::debug!("Invoking {} with {:?}", name, bound);
        dispatch(tools, capability, bound).await
    }
}

/// Describe the operations a tools instance exposes.
///
/// Base operations come first in declaration order, skipping any the driver
/// reports as unsupported. Extensions follow; an extension named like a base
/// operation replaces that entry in place.
pub fn describe_tools<T: Tools + ?Sized>(tools: &T) -> CapabilityMap {
    let mut entries = IndexMap::new();
    for op in Operation::ALL {
        if tools.supports(op) {
            entries.insert(op.name().to_string(), tools.capability(op));
        }
    }
    for capability in tools.extensions() {
        entries.insert(capability.name.clone(), capability);
    }
    CapabilityMap { entries }
}
