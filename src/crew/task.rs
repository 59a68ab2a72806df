use std::fmt;

use serde::{Deserialize, Serialize};

use super::role::RoleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    Plan,
    Write,
    Edit,
}

impl StageId {
    pub const ORDER: [StageId; 3] = [StageId::Plan, StageId::Write, StageId::Edit];

    /// Key under which the engine reports this stage's output.
    pub fn key(self) -> &'static str {
        match self {
            StageId::Plan => "plan",
            StageId::Write => "write",
            StageId::Edit => "edit",
        }
    }

    /// Section heading used when presenting the stage's output.
    pub fn heading(self) -> &'static str {
        match self {
            StageId::Plan => "Planner Output",
            StageId::Write => "Writer Output",
            StageId::Edit => "Editor Output",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One stage's instructions, acceptance criteria and assigned role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub stage: StageId,
    pub description: String,
    pub expected_output: String,
    pub assigned_role: RoleId,
}

impl WorkUnit {
    pub fn new(
        stage: StageId,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        assigned_role: RoleId,
    ) -> Self {
        Self {
            stage,
            description: description.into(),
            expected_output: expected_output.into(),
            assigned_role,
        }
    }
}
