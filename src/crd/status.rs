//! # Status
//!
//! Status types for ASecret and AGenerator resources.

use serde::{Deserialize, Serialize};

/// Status of the ASecret resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ASecretStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Last time both stores were successfully synced (RFC3339)
    #[serde(default)]
    pub last_sync_time: Option<String>,
    /// Generation of the spec that was last synced
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// When the next periodic sync is due (RFC3339)
    #[serde(default)]
    pub next_sync_time: Option<String>,
}

impl ASecretStatus {
    /// The `Synced` condition, if any
    #[must_use]
    pub fn synced_condition(&self) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.r#type == crate::constants::CONDITION_SYNCED)
    }
}

/// Status of the AGenerator resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AGeneratorStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    /// Build a condition stamped with the current time
    #[must_use]
    pub fn now(r#type: &str, status: bool, reason: &str, message: impl Into<String>) -> Self {
        Self {
            r#type: r#type.to_string(),
            status: if status { "True" } else { "False" }.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.to_string()),
            message: Some(message.into()),
        }
    }

    /// Same type, status, reason and message, ignoring the transition time
    #[must_use]
    pub fn same_state(&self, other: &Condition) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }

    /// Keep the previous transition time when nothing but the timestamp changed
    #[must_use]
    pub fn settled_against(mut self, previous: Option<&Condition>) -> Self {
        if let Some(previous) = previous.filter(|p| self.same_state(p)) {
            self.last_transition_time = previous.last_transition_time.clone();
        }
        self
    }
}
