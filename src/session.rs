//! Agent-facing session around a single tools instance.
//!
//! A [`ToolSession`] dispatches operations by name, keeps a trajectory of
//! every invocation and exposes the completion record so the caller can end
//! its loop. It never stops anything on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::describe::{describe_tools, CapabilityMap};
use crate::tools::{Tools, ToolsError};

/// Reason reported when a task succeeded without giving one.
pub const DEFAULT_SUCCESS_REASON: &str = "Task completed successfully";
/// Reason reported when a task failed without giving one.
pub const DEFAULT_FAILURE_REASON: &str = "Task failed without specific reason";

/// Result of one recorded invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok { value: Value },
    Error { message: String },
}

/// One entry of the session trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub step: usize,
    pub operation: String,
    pub arguments: Value,
    pub outcome: StepOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Owns a tools instance for one automation session.
pub struct ToolSession<T: Tools> {
    tools: T,
    trajectory: Vec<TrajectoryStep>,
}

impl<T: Tools> ToolSession<T> {
    pub fn new(tools: T) -> Self {
        Self {
            tools,
            trajectory: Vec::new(),
        }
    }

    /// Fresh descriptor for the wrapped instance.
    pub fn capabilities(&self) -> CapabilityMap {
        describe_tools(&self.tools)
    }

    /// Invoke an operation by name and record it in the trajectory.
    pub async fn invoke(&mut self, name: &str, args: Value) -> Result<Value, ToolsError> {
        let capabilities = describe_tools(&self.tools);
        let result = capabilities.invoke(&mut self.tools, name, args.clone()).await;

        let outcome = match &result {
            Ok(value) => StepOutcome::Ok {
                value: value.clone(),
            },
            Err(e) => {
                tracing::warn!("Operation {} failed: {}", name, e);
                StepOutcome::Error {
                    message: e.to_string(),
                }
            }
        };
        self.trajectory.push(TrajectoryStep {
            step: self.trajectory.len() + 1,
            operation: name.to_string(),
            arguments: args,
            outcome,
            timestamp: Utc::now(),
        });
        tracing::debug!("Trajectory step: {} (step {})", name, self.trajectory.len());

        result
    }

    /// Clear the completion record before handing the session a new task.
    ///
    /// Memory is kept across tasks.
    pub fn begin_task(&mut self) {
        self.tools.completion_mut().reset();
    }

    /// Whether `complete` has been called since the last [`begin_task`](Self::begin_task).
    pub fn is_finished(&self) -> bool {
        self.tools.completion().is_finished()
    }

    /// `(success, reason)` of the current task, once finished.
    pub fn outcome(&self) -> Option<(bool, String)> {
        self.tools.completion().get().map(|record| {
            let reason = if !record.reason.is_empty() {
                record.reason.clone()
            } else if record.success {
                DEFAULT_SUCCESS_REASON.to_string()
            } else {
                DEFAULT_FAILURE_REASON.to_string()
            };
            (record.success, reason)
        })
    }

    /// Copy of the recorded steps.
    pub fn trajectory(&self) -> Vec<TrajectoryStep> {
        self.trajectory.clone()
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut T {
        &mut self.tools
    }

    pub fn into_inner(self) -> T {
        self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Bounds, MockTools, UiElement};
    use serde_json::json;

    fn session() -> ToolSession<MockTools> {
        let tools = MockTools::new()
            .with_elements(vec![UiElement {
                class_name: "android.widget.Button".to_string(),
                text: "Next".to_string(),
                bounds: Bounds::new(0, 0, 100, 100),
                clickable: true,
                ..Default::default()
            }])
            .with_package("com.example.notes", false);
        ToolSession::new(tools)
    }

    #[tokio::test]
    async fn test_invoke_records_trajectory() {
        let mut session = session();
        let state = session.invoke("get_state", Value::Null).await.unwrap();
        assert_eq!(state["elements"][0]["text"], "Next");

        let tapped = session.invoke("tap_by_index", json!({"index": 0})).await.unwrap();
        assert_eq!(tapped, Value::Bool(true));

        let missed = session.invoke("tap_by_index", json!({"index": 9})).await.unwrap();
        assert_eq!(missed, Value::Bool(false));

        let err = session.invoke("teleport", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolsError::UnknownOperation(_)));

        let trajectory = session.trajectory();
        assert_eq!(trajectory.len(), 4);
        assert_eq!(trajectory[1].step, 2);
        assert_eq!(trajectory[1].operation, "tap_by_index");
        assert_eq!(trajectory[1].arguments, json!({"index": 0}));
        assert!(matches!(trajectory[3].outcome, StepOutcome::Error { .. }));
    }

    #[tokio::test]
    async fn test_completion_does_not_stop_session() {
        let mut session = session();
        assert!(!session.is_finished());

        session.invoke("complete", json!([true, "found it"])).await.unwrap();
        assert!(session.is_finished());
        assert_eq!(session.outcome(), Some((true, "found it".to_string())));

        // Still usable after completion.
        let result = session.invoke("back", Value::Null).await.unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[tokio::test]
    async fn test_default_reasons_and_begin_task() {
        let mut session = session();
        session.invoke("complete", json!({"success": false})).await.unwrap();
        assert_eq!(
            session.outcome(),
            Some((false, DEFAULT_FAILURE_REASON.to_string()))
        );

        session.invoke("remember", json!(["order #4411"])).await.unwrap();
        session.begin_task();
        assert!(!session.is_finished());
        assert_eq!(session.outcome(), None);
        assert_eq!(session.tools().memory().texts(), vec!["order #4411"]);

        session.invoke("complete", json!([true])).await.unwrap();
        assert_eq!(
            session.outcome(),
            Some((true, DEFAULT_SUCCESS_REASON.to_string()))
        );
    }

    #[test]
    fn test_step_outcome_serialization() {
        let outcome = StepOutcome::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({"status": "error", "message": "boom"}));
    }
}
