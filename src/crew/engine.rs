use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::pipeline::Pipeline;
use super::task::{StageId, WorkUnit};
use crate::provider::{ChatMessage, ChatModel};

/// Executes a whole pipeline and returns a stage-indexed JSON document.
///
/// The response shape is loosely typed: each stage key maps to an
/// object with at least an `output` string. Callers validate it.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn kickoff(&self, pipeline: &Pipeline, inputs: &HashMap<String, String>)
    -> Result<Value>;
}

/// Replaces `{key}` placeholders with values from `inputs`. Unknown keys are
/// left untouched.
pub fn interpolate_inputs(template: &str, inputs: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match inputs.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn task_prompt(
    unit: &WorkUnit,
    inputs: &HashMap<String, String>,
    context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        interpolate_inputs(&unit.description, inputs),
        interpolate_inputs(&unit.expected_output, inputs)
    );

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }

    prompt
}

/// Runs units one after another against a single chat model, handing each
/// stage's output to the next as context.
pub struct SequentialEngine {
    model: Arc<dyn ChatModel>,
}

impl SequentialEngine {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Engine for SequentialEngine {
    async fn kickoff(
        &self,
        pipeline: &Pipeline,
        inputs: &HashMap<String, String>,
    ) -> Result<Value> {
        pipeline.validate()?;

        let mut stages = Map::new();
        let mut previous: Option<String> = None;

        for stage in StageId::ORDER {
            let unit = pipeline
                .unit(stage)
                .ok_or_else(|| anyhow::anyhow!("pipeline has no '{stage}' unit"))?;
            let role = pipeline.role(unit.assigned_role).ok_or_else(|| {
                anyhow::anyhow!("role '{}' is missing", unit.assigned_role.label())
            })?;

            let persona = interpolate_inputs(&role.persona_prompt(), inputs);
            let messages = vec![
                ChatMessage::system(persona),
                ChatMessage::user(task_prompt(unit, inputs, previous.as_deref())),
            ];

            if role.verbose {
                tracing::info!(stage = %unit.stage, role = %role.role_name, model = self.model.name(), "stage started");
            } else {
                tracing::debug!(stage = %unit.stage, role = %role.role_name, "stage started");
            }

            let output = self
                .model
                .complete(&messages)
                .await
                .with_context(|| format!("stage '{}' ({}) failed", unit.stage, role.role_name))?;

            if role.verbose {
                tracing::info!(stage = %unit.stage, chars = output.len(), "stage completed");
            } else {
                tracing::debug!(stage = %unit.stage, chars = output.len(), "stage completed");
            }

            stages.insert(
                unit.stage.key().to_string(),
                json!({
                    "role": role.role_name,
                    "description": interpolate_inputs(&unit.description, inputs),
                    "expected_output": interpolate_inputs(&unit.expected_output, inputs),
                    "output": output,
                }),
            );
            previous = Some(output);
        }

        stages.insert("verbosity".to_string(), json!(pipeline.verbosity.level()));
        stages.insert("model".to_string(), json!(self.model.name()));
        Ok(Value::Object(stages))
    }
}
