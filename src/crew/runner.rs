use std::collections::HashMap;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Deserialize;
use serde_json::{Value, json};

use super::engine::Engine;
use super::pipeline::Pipeline;
use super::task::StageId;
use crate::error::RunError;
use crate::telemetry::{TelemetrySink, round_metric};

/// Per-stage outputs of one completed pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub plan: String,
    pub write: String,
    pub edit: String,
    pub raw: Option<Value>,
}

impl RunResult {
    pub fn output(&self, stage: StageId) -> &str {
        match stage {
            StageId::Plan => &self.plan,
            StageId::Write => &self.write,
            StageId::Edit => &self.edit,
        }
    }

    /// Validates a raw engine response into the fixed three-stage shape.
    pub fn from_engine_response(raw: Value) -> Result<Self, RunError> {
        #[derive(Deserialize)]
        struct StageOutput {
            output: String,
        }

        #[derive(Deserialize)]
        struct StageOutputs {
            plan: StageOutput,
            write: StageOutput,
            edit: StageOutput,
        }

        let parsed = serde_json::from_value::<StageOutputs>(raw.clone())
            .map_err(|err| RunError::MalformedResponse(err.to_string()))?;

        Ok(Self {
            plan: parsed.plan.output,
            write: parsed.write.output,
            edit: parsed.edit.output,
            raw: Some(raw),
        })
    }
}

pub type RunOutcome = Result<RunResult, RunError>;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

/// Single-attempt execution boundary around an [`Engine`].
///
/// Every engine failure is converted into a [`RunError`]; nothing partial
/// escapes a failed run.
#[derive(Clone)]
pub struct PipelineRunner {
    engine: Arc<dyn Engine>,
    telemetry: TelemetrySink,
}

impl PipelineRunner {
    pub fn new(engine: Arc<dyn Engine>, telemetry: TelemetrySink) -> Self {
        Self { engine, telemetry }
    }

    pub async fn execute(&self, pipeline: &Pipeline, topic: &str) -> RunOutcome {
        self.execute_until(pipeline, topic, std::future::pending::<()>())
            .await
    }

    /// Runs the pipeline, abandoning it if `cancel` resolves first.
    pub async fn execute_until<C>(&self, pipeline: &Pipeline, topic: &str, cancel: C) -> RunOutcome
    where
        C: Future<Output = ()>,
    {
        let started_at = Instant::now();
        let mut inputs = HashMap::new();
        inputs.insert("topic".to_string(), topic.to_string());

        self.telemetry.emit(
            "pipeline.started",
            json!({
                "topic": topic,
                "stages": pipeline.units.len(),
                "verbosity": pipeline.verbosity.level()
            }),
        );

        let outcome = tokio::select! {
            response = AssertUnwindSafe(self.engine.kickoff(pipeline, &inputs)).catch_unwind() => match response {
                Ok(Ok(raw)) => RunResult::from_engine_response(raw),
                Ok(Err(err)) => Err(RunError::engine(&err)),
                Err(panic) => Err(RunError::Engine(format!(
                    "engine panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            },
            _ = cancel => Err(RunError::Cancelled),
        };

        let latency_ms = round_metric(started_at.elapsed().as_secs_f64() * 1000.0);
        match &outcome {
            Ok(_) => {
                tracing::info!(topic, latency_ms, "content pipeline completed");
                self.telemetry.emit(
                    "pipeline.completed",
                    json!({ "topic": topic, "latency_ms": latency_ms }),
                );
            }
            Err(err) => {
                tracing::warn!(topic, error = %err, "content pipeline failed");
                self.telemetry.emit(
                    "pipeline.failed",
                    json!({
                        "topic": topic,
                        "error": err.to_string(),
                        "latency_ms": latency_ms
                    }),
                );
            }
        }

        outcome
    }
}
