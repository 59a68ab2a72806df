use serde::{Deserialize, Serialize};

/// Stable handle a work unit uses to reference its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleId {
    Planner,
    Writer,
    Editor,
}

impl RoleId {
    pub fn label(self) -> &'static str {
        match self {
            RoleId::Planner => "planner",
            RoleId::Writer => "writer",
            RoleId::Editor => "editor",
        }
    }
}

/// A named persona with a goal and backstory guiding one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRole {
    pub id: RoleId,
    pub role_name: String,
    pub goal: String,
    pub backstory: String,
    pub allows_delegation: bool,
    pub verbose: bool,
}

impl WorkerRole {
    pub fn new(
        id: RoleId,
        role_name: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        verbose: bool,
    ) -> Self {
        Self {
            id,
            role_name: role_name.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allows_delegation: false,
            verbose,
        }
    }

    /// System prompt handed to the model for every unit this role owns.
    pub fn persona_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role_name, self.backstory, self.goal
        )
    }
}
