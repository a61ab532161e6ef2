//! Serve command handler.
//!
//! Runs the browser front end: a question form, index diagnostics, recent
//! history and an embedded viewer for the source document. Pages are rendered
//! from Handlebars templates compiled into the binary.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use clap::Args;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{BuildOptions, TutorContext};

/// Characters of a question shown in a history heading.
const HEADING_CHARS: usize = 50;

/// Records shown on the history page.
const HISTORY_LIMIT: usize = 5;

const TEMPLATES: [(&str, &str); 5] = [
    ("page", include_str!("../../templates/page.hbs")),
    ("ask", include_str!("../../templates/ask.hbs")),
    ("index", include_str!("../../templates/index.hbs")),
    ("history", include_str!("../../templates/history.hbs")),
    ("source", include_str!("../../templates/source.hbs")),
];

/// Start the web front end
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides `server.bind`)
    #[arg(long, env = "TUTOR_BIND")]
    pub bind: Option<String>,

    /// Drop the stored collection and rebuild it before serving
    #[arg(long)]
    pub rebuild: bool,
}

impl ServeCommand {
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        tracing::debug!("Serve command options: {:?}", self);

        if let Some(ref bind) = self.bind {
            config.bind = bind.clone();
        }

        let addr: SocketAddr = config
            .bind
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address {}: {}", config.bind, e)))?;

        let ctx = TutorContext::initialize(
            config,
            BuildOptions {
                rebuild: self.rebuild,
            },
        )
        .await?;

        let state = Arc::new(AppState::new(ctx)?);
        let app = router(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Science tutor listening on http://{}", addr);
        println!("Science tutor listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| AppError::Other(format!("Server shutdown: {}", e)))?;

        Ok(())
    }
}

/// Shared request state.
pub struct AppState {
    ctx: TutorContext,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(ctx: TutorContext) -> AppResult<Self> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(false);

        for (name, source) in TEMPLATES {
            templates
                .register_template_string(name, source)
                .map_err(|e| AppError::Other(format!("Invalid template '{}': {}", name, e)))?;
        }

        Ok(Self { ctx, templates })
    }

    /// Render `template` with `data`, wrapped in the page layout.
    fn render<T: Serialize>(&self, title: &str, template: &str, data: &T) -> Result<Html<String>, PageError> {
        let body = self.templates.render(template, data)?;

        let config = self.ctx.config();
        let page = serde_json::json!({
            "title": title,
            "body": body,
            "sidebar": {
                "model": config.model,
                "pdf": config.pdf_path.display().to_string(),
                "store_connected": config.persist_path().exists(),
            },
        });

        Ok(Html(self.templates.render("page", &page)?))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ask", post(ask))
        .route("/index", get(index_details))
        .route("/history", get(history))
        .route("/source", get(source))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Template rendering failure, shown as a 500.
#[derive(Debug)]
pub struct PageError(String);

impl From<handlebars::RenderError> for PageError {
    fn from(err: handlebars::RenderError) -> Self {
        PageError(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to render page: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Default, Serialize)]
struct AskView {
    question: String,
    answer: Option<String>,
    generated_at: Option<String>,
    warning: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    heading: String,
    timestamp: String,
    answer: String,
}

#[derive(Debug, Default, Serialize)]
struct HistoryView {
    records: Vec<HistoryEntry>,
    error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct SourceView {
    file_name: String,
    data: String,
    error: Option<String>,
}

async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    state.render("Ask", "ask", &AskView::default())
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AskForm>,
) -> Result<Html<String>, PageError> {
    let question = form.question.trim().to_string();
    let history = state.ctx.history();

    if question.is_empty() {
        history.log_error("Empty question submitted", None);
        let view = AskView {
            warning: Some("Please enter a question!".to_string()),
            ..Default::default()
        };
        return state.render("Ask", "ask", &view);
    }

    let view = match state.ctx.ask(&question).await {
        Ok(answered) => {
            state.ctx.record_answer(&answered).await;
            AskView {
                question,
                answer: Some(answered.answer),
                generated_at: Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                ..Default::default()
            }
        }
        Err(e) => {
            let message = format!("Error generating answer: {}", e);
            history.log_error(&message, Some(&question));
            AskView {
                question,
                error: Some(message),
                ..Default::default()
            }
        }
    };

    state.render("Answer", "ask", &view)
}

async fn index_details(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let details = state.ctx.index_details();
    state.render("Vector Store", "index", &details)
}

async fn history(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let view = match state.ctx.history().recent(HISTORY_LIMIT) {
        Ok(records) => HistoryView {
            records: records
                .into_iter()
                .map(|record| HistoryEntry {
                    heading: truncate_chars(&record.question, HEADING_CHARS),
                    timestamp: record.timestamp,
                    answer: record.answer,
                })
                .collect(),
            error: None,
        },
        Err(e) => HistoryView {
            records: Vec::new(),
            error: Some(format!("Error loading query history: {}", e)),
        },
    };

    state.render("History", "history", &view)
}

async fn source(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let path = state.ctx.config().source_path();

    let view = if !path.exists() {
        SourceView {
            error: Some("PDF file not found!".to_string()),
            ..Default::default()
        }
    } else {
        match tokio::fs::read(&path).await {
            Ok(bytes) => SourceView {
                file_name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                data: STANDARD.encode(bytes),
                error: None,
            },
            Err(e) => {
                tracing::error!("Failed to read {:?}: {}", path, e);
                SourceView {
                    error: Some(format!("Error displaying PDF: {}", e)),
                    ..Default::default()
                }
            }
        }
    };

    state.render("Source", "source", &view)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
