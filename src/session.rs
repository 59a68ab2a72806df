use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use crate::config::RuntimeConfig;
use crate::crew::engine::{Engine, SequentialEngine};
use crate::crew::pipeline::{Pipeline, build_content_pipeline};
use crate::crew::runner::{PipelineRunner, RunOutcome};
use crate::error::RunError;
use crate::present::{Section, present, present_error};
use crate::provider::{LlmConfig, OpenAiChatModel};
use crate::telemetry::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCredential,
    AwaitingTopic,
    Ready,
    Running,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::AwaitingCredential => "awaiting-credential",
            SessionState::AwaitingTopic => "awaiting-topic",
            SessionState::Ready => "ready",
            SessionState::Running => "running",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
        }
    }
}

/// Everything one run needs, captured when the run is triggered.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub api_key: String,
    pub topic: String,
    pub verbose: bool,
    pub pipeline: Pipeline,
}

/// Form state of one user session. Credential, topic and verbosity persist
/// across runs; a fresh pipeline is built for every run.
#[derive(Debug, Clone)]
pub struct ContentSession {
    api_key: Option<String>,
    topic: String,
    verbose: bool,
    state: SessionState,
}

impl ContentSession {
    pub fn new(default_topic: &str, default_verbose: bool) -> Self {
        let mut session = Self {
            api_key: None,
            topic: default_topic.trim().to_string(),
            verbose: default_verbose,
            state: SessionState::AwaitingCredential,
        };
        session.refresh_state();
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.refresh_state();
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.topic = topic.trim().to_string();
        self.refresh_state();
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn input_state(&self) -> SessionState {
        if self.api_key.is_none() {
            SessionState::AwaitingCredential
        } else if self.topic.is_empty() {
            SessionState::AwaitingTopic
        } else {
            SessionState::Ready
        }
    }

    fn refresh_state(&mut self) {
        if self.state == SessionState::Running {
            return;
        }
        self.state = self.input_state();
    }

    /// Moves to `Running` and snapshots the inputs, or explains why the run
    /// cannot start. Nothing is built unless the credential is present.
    pub fn begin_run(&mut self) -> Result<RunRequest, RunError> {
        if self.state == SessionState::Running {
            return Err(RunError::Busy);
        }
        let api_key = self.api_key.clone().ok_or(RunError::MissingCredential)?;
        if self.topic.is_empty() {
            return Err(RunError::EmptyTopic);
        }

        self.state = SessionState::Running;
        Ok(RunRequest {
            api_key,
            topic: self.topic.clone(),
            verbose: self.verbose,
            pipeline: build_content_pipeline(&self.topic, self.verbose),
        })
    }

    /// Ends a run that produced no outcome at all, e.g. when its task died.
    pub fn abort_run(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Failed;
        }
    }

    pub fn finish_run(&mut self, outcome: &RunOutcome) {
        self.state = if outcome.is_ok() {
            SessionState::Succeeded
        } else {
            SessionState::Failed
        };
    }
}

/// Builds the engine for a run from the credential the user supplied.
pub type EngineFactory = Arc<dyn Fn(&LlmConfig) -> Result<Arc<dyn Engine>> + Send + Sync>;

pub fn openai_engine_factory() -> EngineFactory {
    Arc::new(|config: &LlmConfig| {
        let model = OpenAiChatModel::new(config.clone())?;
        Ok(Arc::new(SequentialEngine::new(Arc::new(model))) as Arc<dyn Engine>)
    })
}

/// Glue between a session and the crew: gate, build, run, present.
#[derive(Clone)]
pub struct ContentStudio {
    cfg: RuntimeConfig,
    telemetry: TelemetrySink,
    engine_factory: EngineFactory,
}

impl ContentStudio {
    pub fn new(cfg: RuntimeConfig, telemetry: TelemetrySink, engine_factory: EngineFactory) -> Self {
        Self {
            cfg,
            telemetry,
            engine_factory,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.cfg
    }

    pub fn new_session(&self) -> ContentSession {
        ContentSession::new(&self.cfg.default_topic, self.cfg.default_verbose)
    }

    pub async fn generate(&self, session: &mut ContentSession) -> Vec<Section> {
        self.generate_until(session, std::future::pending::<()>())
            .await
    }

    /// Runs the crew for the session's current inputs. Always returns
    /// renderable sections; errors never escape.
    pub async fn generate_until<C>(&self, session: &mut ContentSession, cancel: C) -> Vec<Section>
    where
        C: Future<Output = ()>,
    {
        let request = match session.begin_run() {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(state = session.state().label(), reason = %err, "content run blocked");
                self.telemetry.emit(
                    "session.blocked",
                    json!({ "reason": err.to_string(), "state": session.state().label() }),
                );
                return vec![present_error(&err)];
            }
        };

        let outcome = self.run_request(&request, cancel).await;
        session.finish_run(&outcome);
        present(&outcome, request.verbose)
    }

    async fn run_request<C>(&self, request: &RunRequest, cancel: C) -> RunOutcome
    where
        C: Future<Output = ()>,
    {
        let llm = LlmConfig::from_runtime(&self.cfg, &request.api_key);
        let engine = (self.engine_factory)(&llm).map_err(|err| RunError::engine(&err))?;
        PipelineRunner::new(engine, self.telemetry.clone())
            .execute_until(&request.pipeline, &request.topic, cancel)
            .await
    }
}
