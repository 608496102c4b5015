use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::emotion::{analyze_emotion, EmotionAnalysis, EmotionScorer};
use super::session::{session_cookie, DisplayOptions, HistoryEntry, SessionStore};
use super::views::Views;
use crate::classifier::SentimentModel;

/// Any failure while serving a demo request. Rendered as a bare 500.
#[derive(Debug)]
pub struct DemoError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for DemoError {
    fn from(value: E) -> Self {
        Self(value.into())
    }
}

impl IntoResponse for DemoError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

type DemoResult<T> = Result<T, DemoError>;

#[derive(Debug, Default, Deserialize)]
pub struct TextInput {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct LocalPrediction {
    pub label: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsForm {
    show_chart: Option<String>,
    show_top3: Option<String>,
    show_history: Option<String>,
    show_emoji: Option<String>,
}

impl From<OptionsForm> for DisplayOptions {
    fn from(form: OptionsForm) -> Self {
        Self {
            show_chart: form.show_chart.is_some(),
            show_top3: form.show_top3.is_some(),
            show_history: form.show_history.is_some(),
            show_emoji: form.show_emoji.is_some(),
        }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> &'static str {
    "Healthy"
}

/// Runs the scorer on the blocking pool.
async fn analyze(scorer: Arc<dyn EmotionScorer>, text: String) -> DemoResult<EmotionAnalysis> {
    let analysis =
        tokio::task::spawn_blocking(move || analyze_emotion(scorer.as_ref(), &text)).await??;
    info!(
        label = %analysis.label,
        confidence = analysis.confidence,
        "analyzed text"
    );
    Ok(analysis)
}

// Zero-shot demo

#[derive(Clone)]
pub struct ZeroShotState {
    pub scorer: Arc<dyn EmotionScorer>,
    pub views: Arc<Views>,
}

/// GET/POST / and POST /api/predict for the plain zero-shot demo.
pub fn zero_shot_router(state: ZeroShotState) -> Router {
    Router::new()
        .route("/", get(zero_shot_page).post(zero_shot_submit))
        .route("/api/predict", post(zero_shot_api))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn zero_shot_page(State(state): State<ZeroShotState>) -> DemoResult<Html<String>> {
    Ok(Html(state.views.zero_shot("", None)?))
}

async fn zero_shot_submit(
    State(state): State<ZeroShotState>,
    Form(input): Form<TextInput>,
) -> DemoResult<Html<String>> {
    let analysis = analyze(state.scorer.clone(), input.text.clone()).await?;
    Ok(Html(state.views.zero_shot(&input.text, Some(&analysis))?))
}

async fn zero_shot_api(
    State(state): State<ZeroShotState>,
    Json(input): Json<TextInput>,
) -> DemoResult<Json<EmotionAnalysis>> {
    Ok(Json(analyze(state.scorer, input.text).await?))
}

// Styled demo

#[derive(Clone)]
pub struct StyledState {
    pub scorer: Arc<dyn EmotionScorer>,
    pub views: Arc<Views>,
    pub sessions: Arc<SessionStore>,
}

/// The zero-shot demo plus per-session history and display toggles.
pub fn styled_router(state: StyledState) -> Router {
    Router::new()
        .route("/", get(styled_page).post(styled_submit))
        .route("/options", post(styled_options))
        .route("/history/clear", post(styled_clear_history))
        .route("/api/predict", post(styled_api))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Attaches the session cookie when the request wrote to a fresh session.
fn with_cookie(id: &str, fresh: bool, response: impl IntoResponse) -> Response {
    if fresh {
        ([(SET_COOKIE, session_cookie(id))], response).into_response()
    } else {
        response.into_response()
    }
}

fn redirect_home(id: &str, fresh: bool) -> Response {
    with_cookie(id, fresh, (StatusCode::SEE_OTHER, [(LOCATION, "/")]))
}

async fn styled_page(State(state): State<StyledState>, headers: HeaderMap) -> DemoResult<Response> {
    let (id, _) = state.sessions.resolve(&headers);
    let html = state
        .sessions
        .view(&id, |session| state.views.styled("", None, session))?;
    Ok(Html(html).into_response())
}

async fn styled_submit(
    State(state): State<StyledState>,
    headers: HeaderMap,
    Form(input): Form<TextInput>,
) -> DemoResult<Response> {
    let (id, fresh) = state.sessions.resolve(&headers);
    let analysis = analyze(state.scorer.clone(), input.text.clone()).await?;
    let html = state.sessions.with_session(&id, |session| {
        if !input.text.trim().is_empty() {
            session.record(HistoryEntry {
                text: input.text.clone(),
                label: analysis.label.clone(),
                confidence: analysis.confidence,
            });
        }
        state.views.styled(&input.text, Some(&analysis), session)
    })?;
    Ok(with_cookie(&id, fresh, Html(html)))
}

async fn styled_options(
    State(state): State<StyledState>,
    headers: HeaderMap,
    Form(form): Form<OptionsForm>,
) -> Response {
    let (id, fresh) = state.sessions.resolve(&headers);
    let options = DisplayOptions::from(form);
    state
        .sessions
        .with_session(&id, |session| session.options = options);
    redirect_home(&id, fresh)
}

async fn styled_clear_history(State(state): State<StyledState>, headers: HeaderMap) -> Response {
    let (id, fresh) = state.sessions.resolve(&headers);
    if !fresh {
        state
            .sessions
            .with_session(&id, |session| session.clear_history());
    }
    redirect_home(&id, false)
}

async fn styled_api(
    State(state): State<StyledState>,
    Json(input): Json<TextInput>,
) -> DemoResult<Json<EmotionAnalysis>> {
    Ok(Json(analyze(state.scorer, input.text).await?))
}

// Local model demo

#[derive(Clone)]
pub struct LocalState {
    pub model: Arc<SentimentModel>,
    pub views: Arc<Views>,
}

/// Serves predictions from a locally trained [`SentimentModel`].
pub fn local_router(state: LocalState) -> Router {
    Router::new()
        .route("/", get(local_page).post(local_submit))
        .route("/api/predict", post(local_api))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn local_page(State(state): State<LocalState>) -> DemoResult<Html<String>> {
    Ok(Html(state.views.local("", None)?))
}

async fn local_submit(
    State(state): State<LocalState>,
    Form(input): Form<TextInput>,
) -> DemoResult<Html<String>> {
    let label = state.model.predict_text(&input.text);
    info!(label, "predicted sentiment");
    Ok(Html(state.views.local(&input.text, Some(label))?))
}

async fn local_api(
    State(state): State<LocalState>,
    Json(input): Json<TextInput>,
) -> Json<LocalPrediction> {
    let label = state.model.predict_text(&input.text).to_string();
    info!(%label, "predicted sentiment");
    Json(LocalPrediction { label })
}
