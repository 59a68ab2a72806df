use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router as AxumRouter};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::RunError;
use crate::present::{PROCESSING_NOTICE, Section, escape_html, present_error, render_html};
use crate::session::{ContentSession, ContentStudio};
use crate::telemetry::{TelemetrySink, round_metric};

/// One browser session: the form state plus the studio that runs it. The
/// mutex doubles as the "run in flight" guard.
pub struct ServerState {
    pub studio: ContentStudio,
    pub session: Arc<tokio::sync::Mutex<ContentSession>>,
    pub telemetry: TelemetrySink,
}

impl ServerState {
    pub fn new(studio: ContentStudio, telemetry: TelemetrySink) -> Self {
        let session = studio.new_session();
        Self {
            studio,
            session: Arc::new(tokio::sync::Mutex::new(session)),
            telemetry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServerHealthResponse {
    pub status: &'static str,
    pub app_name: String,
    pub profile: String,
    pub model: String,
}

/// Fields posted by the content form. Checkboxes are absent when unticked.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub topic: String,
    pub verbose: Option<String>,
}

impl GenerateForm {
    pub fn verbose_checked(&self) -> bool {
        self.verbose
            .as_deref()
            .map(|value| !matches!(value, "" | "off" | "false" | "0"))
            .unwrap_or(false)
    }
}

pub struct FormView<'a> {
    pub app_name: &'a str,
    pub topic: &'a str,
    pub verbose: bool,
    pub has_api_key: bool,
    pub busy: bool,
}

pub fn render_form_page(view: &FormView<'_>, sections: &[Section]) -> String {
    let checked = if view.verbose { " checked" } else { "" };
    let disabled = if view.busy { " disabled" } else { "" };
    let key_placeholder = if view.has_api_key {
        "Key saved for this session"
    } else {
        "sk-..."
    };

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n\
         <form method=\"post\" action=\"/generate\" onsubmit=\"this.querySelector('button').disabled=true;\
         document.getElementById('notice').hidden=false;\">\n\
         <label>Enter your OpenAI API key:\n<input type=\"password\" name=\"api_key\" placeholder=\"{key_placeholder}\" autocomplete=\"off\"></label>\n\
         <label>Enter the topic for content creation:\n<input type=\"text\" name=\"topic\" value=\"{topic}\"></label>\n\
         <label class=\"check\"><input type=\"checkbox\" name=\"verbose\" value=\"on\"{checked}> Show detailed debug logs</label>\n\
         <button type=\"submit\"{disabled}>Generate Content</button>\n\
         <div id=\"notice\" class=\"alert info\" hidden>{notice}</div>\n\
         </form>\n{results}</body>\n</html>\n",
        title = escape_html(view.app_name),
        style = PAGE_STYLE,
        key_placeholder = key_placeholder,
        topic = escape_html(view.topic),
        checked = checked,
        disabled = disabled,
        notice = PROCESSING_NOTICE,
        results = render_html(sections),
    )
}

const PAGE_STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:.75rem 0}input[type=text],input[type=password]{width:100%;padding:.4rem}\
.check{display:flex;gap:.5rem;align-items:center}pre{white-space:pre-wrap;background:#f6f6f6;padding:1rem}\
.alert{padding:.75rem;margin:1rem 0;border-radius:4px}.success{background:#e6f4ea}\
.warning{background:#fff4e5}.error{background:#fdecea}.info{background:#e8f0fe}";

pub type ApiError = (StatusCode, Html<String>);

fn form_view<'a>(state: &'a ServerState, session: &'a ContentSession) -> FormView<'a> {
    FormView {
        app_name: &state.studio.config().app_name,
        topic: session.topic(),
        verbose: session.verbose(),
        has_api_key: session.api_key().is_some(),
        busy: false,
    }
}

/// Re-renders the submitted form with a single notice when no run result is
/// available.
fn rejected_page(
    state: &ServerState,
    form: &GenerateForm,
    status: StatusCode,
    notice: Section,
) -> ApiError {
    let page = render_form_page(
        &FormView {
            app_name: &state.studio.config().app_name,
            topic: form.topic.trim(),
            verbose: form.verbose_checked(),
            has_api_key: true,
            busy: status == StatusCode::CONFLICT,
        },
        &[notice],
    );
    (status, Html(page))
}

pub async fn handle_server_health(
    State(state): State<Arc<ServerState>>,
) -> Json<ServerHealthResponse> {
    let cfg = state.studio.config();
    Json(ServerHealthResponse {
        status: "ok",
        app_name: cfg.app_name.clone(),
        profile: cfg.profile.clone(),
        model: cfg.model.clone(),
    })
}

pub async fn handle_form_page(State(state): State<Arc<ServerState>>) -> Html<String> {
    match state.session.try_lock() {
        Ok(session) => {
            let mut sections = Vec::new();
            if session.api_key().is_none() {
                sections.push(present_error(&RunError::MissingCredential));
            }
            Html(render_form_page(&form_view(&state, &session), &sections))
        }
        Err(_) => {
            let cfg = state.studio.config();
            Html(render_form_page(
                &FormView {
                    app_name: &cfg.app_name,
                    topic: &cfg.default_topic,
                    verbose: cfg.default_verbose,
                    has_api_key: true,
                    busy: true,
                },
                &[present_error(&RunError::Busy)],
            ))
        }
    }
}

pub async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, ApiError> {
    let Ok(mut session) = state.session.clone().try_lock_owned() else {
        tracing::warn!("generate request rejected while a run is in flight");
        return Err(rejected_page(
            &state,
            &form,
            StatusCode::CONFLICT,
            present_error(&RunError::Busy),
        ));
    };

    let started_at = Instant::now();
    if !form.api_key.trim().is_empty() {
        session.set_api_key(&form.api_key);
    }
    session.set_topic(&form.topic);
    session.set_verbose(form.verbose_checked());

    // The run owns the session lock on its own task so a client disconnect
    // cannot leave the session stuck in `Running`.
    let run_state = state.clone();
    let run = tokio::spawn(async move {
        let sections = run_state.studio.generate(&mut session).await;
        (sections, session)
    });
    let (sections, session) = match run.await {
        Ok(finished) => finished,
        Err(err) => {
            tracing::error!(error = %err, "content run task failed");
            state.session.lock().await.abort_run();
            return Err(rejected_page(
                &state,
                &form,
                StatusCode::INTERNAL_SERVER_ERROR,
                Section::Error(format!("An error occurred: {err}")),
            ));
        }
    };

    state.telemetry.emit(
        "server.generate.completed",
        json!({
            "state": session.state().label(),
            "sections": sections.len(),
            "latency_ms": round_metric(started_at.elapsed().as_secs_f64() * 1000.0)
        }),
    );

    Ok(Html(render_form_page(&form_view(&state, &session), &sections)))
}

pub fn build_server_router(state: Arc<ServerState>) -> AxumRouter {
    AxumRouter::new()
        .route("/", get(handle_form_page))
        .route("/generate", post(handle_generate))
        .route("/healthz", get(handle_server_health))
        .with_state(state)
}

pub async fn run_server(
    studio: ContentStudio,
    host: String,
    port: u16,
    telemetry: &TelemetrySink,
) -> Result<()> {
    let addr = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid server bind address '{}:{}'", host, port))?;
    let cfg = studio.config().clone();
    let state = Arc::new(ServerState::new(studio, telemetry.clone()));

    telemetry.emit(
        "server.started",
        json!({
            "host": host,
            "port": port,
            "profile": cfg.profile,
            "model": cfg.model
        }),
    );

    println!(
        "Content form listening on http://{} (form: /, health: /healthz)",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind server listener")?;
    axum::serve(listener, build_server_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server runtime failed")
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { println!("\nReceived Ctrl+C, shutting down gracefully..."); }
        _ = terminate => { println!("\nReceived SIGTERM, shutting down gracefully..."); }
    }
}
