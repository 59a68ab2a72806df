use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::role::{RoleId, WorkerRole};
use super::task::{StageId, WorkUnit};

pub const DEFAULT_TOPIC: &str = "Artificial Intelligence";

/// Pipeline-level logging level understood by the engine. Only two values are
/// recognised and both serialise as their numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Verbosity {
    Silent,
    Detailed,
}

impl Verbosity {
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Detailed
        } else {
            Verbosity::Silent
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Verbosity::Silent => 0,
            Verbosity::Detailed => 2,
        }
    }

    pub fn is_detailed(self) -> bool {
        matches!(self, Verbosity::Detailed)
    }
}

impl From<Verbosity> for u8 {
    fn from(verbosity: Verbosity) -> Self {
        verbosity.level()
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Verbosity::Silent),
            2 => Ok(Verbosity::Detailed),
            other => Err(format!("unsupported verbosity level {other}, expected 0 or 2")),
        }
    }
}

/// Ordered plan/write/edit units plus the roles they reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub roles: Vec<WorkerRole>,
    pub units: Vec<WorkUnit>,
    pub verbosity: Verbosity,
}

impl Pipeline {
    pub fn role(&self, id: RoleId) -> Option<&WorkerRole> {
        self.roles.iter().find(|role| role.id == id)
    }

    pub fn unit(&self, stage: StageId) -> Option<&WorkUnit> {
        self.units.iter().find(|unit| unit.stage == stage)
    }

    /// Checks unit order and that every unit's role belongs to this pipeline.
    pub fn validate(&self) -> Result<()> {
        let stages = self.units.iter().map(|unit| unit.stage).collect::<Vec<_>>();
        if stages != StageId::ORDER {
            return Err(anyhow::anyhow!(
                "pipeline stages must be [plan, write, edit], got [{}]",
                stages
                    .iter()
                    .map(|stage| stage.key())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for unit in &self.units {
            if self.role(unit.assigned_role).is_none() {
                return Err(anyhow::anyhow!(
                    "work unit '{}' references role '{}' which is not part of the pipeline",
                    unit.stage,
                    unit.assigned_role.label()
                ));
            }
        }

        Ok(())
    }
}

pub fn planner_role(topic: &str, verbose: bool) -> WorkerRole {
    WorkerRole::new(
        RoleId::Planner,
        "Content Planner",
        format!("Plan engaging and factually accurate content on {topic}"),
        format!(
            "You're planning a blog article about the topic: {topic}. \
             You collect information to help the audience learn something \
             and make informed decisions."
        ),
        verbose,
    )
}

pub fn writer_role(topic: &str, verbose: bool) -> WorkerRole {
    WorkerRole::new(
        RoleId::Writer,
        "Content Writer",
        format!("Write insightful and factually accurate content about {topic}"),
        format!(
            "You're crafting a blog article about the topic: {topic}, \
             using the outline from the Content Planner."
        ),
        verbose,
    )
}

pub fn editor_role(verbose: bool) -> WorkerRole {
    WorkerRole::new(
        RoleId::Editor,
        "Editor",
        "Edit the blog post to ensure quality and alignment with the organization's style.",
        "You are editing a blog post created by the Content Writer, \
         ensuring it adheres to journalistic practices and avoids controversies.",
        verbose,
    )
}

pub fn plan_unit(topic: &str) -> WorkUnit {
    WorkUnit::new(
        StageId::Plan,
        format!(
            "1. Prioritize trends, key players, and noteworthy news about {topic}.\n\
             2. Identify the target audience and their interests.\n\
             3. Develop a detailed content outline, including SEO keywords and resources."
        ),
        "A comprehensive content plan document.",
        RoleId::Planner,
    )
}

pub fn write_unit(topic: &str) -> WorkUnit {
    WorkUnit::new(
        StageId::Write,
        format!(
            "1. Use the content plan to write a compelling blog post on {topic}.\n\
             2. Incorporate SEO keywords naturally and structure the post properly.\n\
             3. Ensure the blog has an engaging introduction, body, and conclusion."
        ),
        "A well-written blog post in markdown format.",
        RoleId::Writer,
    )
}

pub fn edit_unit() -> WorkUnit {
    WorkUnit::new(
        StageId::Edit,
        "Proofread the blog post for grammatical errors and style alignment.",
        "A polished blog post in markdown format.",
        RoleId::Editor,
    )
}

/// Builds the plan -> write -> edit pipeline for `topic`.
///
/// Pure and deterministic: the same arguments always produce an equal
/// pipeline. Callers guarantee a non-empty topic.
pub fn build_content_pipeline(topic: &str, verbose: bool) -> Pipeline {
    Pipeline {
        roles: vec![
            planner_role(topic, verbose),
            writer_role(topic, verbose),
            editor_role(verbose),
        ],
        units: vec![plan_unit(topic), write_unit(topic), edit_unit()],
        verbosity: Verbosity::from_flag(verbose),
    }
}
