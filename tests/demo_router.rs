use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use talksense::classifier::{LogisticRegression, TrainConfig};
use talksense::demo::{
    local_router, styled_router, zero_shot_router, EmotionScorer, LocalState, SessionStore,
    StyledState, Views, ZeroShotState, EMOTION_LABELS,
};
use talksense::features::TfidfVectorizer;
use talksense::pipelines::zero_shot_classification_pipeline::LabelScore;
use talksense::SentimentModel;

/// Puts all the weight on "grateful".
struct StubScorer;

impl EmotionScorer for StubScorer {
    fn score(&self, _text: &str, labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        let rest = 0.1 / (labels.len() - 1) as f32;
        Ok(labels
            .iter()
            .map(|label| LabelScore {
                label: label.to_string(),
                score: if *label == "grateful" { 0.9 } else { rest },
            })
            .collect())
    }
}

struct FailingScorer;

impl EmotionScorer for FailingScorer {
    fn score(&self, _text: &str, _labels: &[&str]) -> anyhow::Result<Vec<LabelScore>> {
        anyhow::bail!("model unavailable")
    }
}

fn views() -> Arc<Views> {
    Arc::new(Views::new().unwrap())
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn trained_model() -> SentimentModel {
    let docs = [
        "love great game",
        "great amazing update",
        "hate awful game",
        "awful broken update",
    ];
    let labels: Vec<String> = ["Positive", "Positive", "Negative", "Negative"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let vectorizer = TfidfVectorizer::fit(&docs, 100).unwrap();
    let features = vectorizer.transform_all(&docs);
    let config = TrainConfig {
        max_iter: 200,
        ..TrainConfig::default()
    };
    let classifier = LogisticRegression::fit(&features, &labels, &config).unwrap();
    SentimentModel::new(vectorizer, classifier).unwrap()
}

fn local_app() -> Router {
    local_router(LocalState {
        model: Arc::new(trained_model()),
        views: views(),
    })
}

fn styled_app_with(sessions: Arc<SessionStore>) -> Router {
    styled_router(StyledState {
        scorer: Arc::new(StubScorer),
        views: views(),
        sessions,
    })
}

fn styled_app() -> Router {
    styled_app_with(Arc::new(SessionStore::new()))
}

#[tokio::test]
async fn health_endpoint() {
    let response = local_app().oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Healthy");
}

#[tokio::test]
async fn local_demo_predicts_a_trained_label() {
    let app = local_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/predict",
            serde_json::json!({ "text": "I LOVE this great game!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["label"], "Positive");

    let response = app
        .oneshot(form_request("/", "text=awful+broken+game", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Predicted sentiment: Negative"));
}

#[tokio::test]
async fn local_demo_blank_input_still_returns_a_known_label() {
    let model = trained_model();
    let classes = model.classes().to_vec();
    let app = local_router(LocalState {
        model: Arc::new(model),
        views: views(),
    });
    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({ "text": "" })))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let label = body["label"].as_str().unwrap();
    assert!(classes.iter().any(|c| c == label));
}

#[tokio::test]
async fn zero_shot_api_ranks_every_label() {
    let app = zero_shot_router(ZeroShotState {
        scorer: Arc::new(StubScorer),
        views: views(),
    });
    let response = app
        .clone()
        .oneshot(json_request("/api/predict", serde_json::json!({ "text": "thank you so much" })))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["label"], "grateful");
    assert_eq!(body["ranking"].as_array().unwrap().len(), EMOTION_LABELS.len());

    let response = app
        .oneshot(form_request("/", "text=thank+you", None))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("grateful (90.0% confidence)"));
}

#[tokio::test]
async fn zero_shot_blank_input_is_neutral() {
    let app = zero_shot_router(ZeroShotState {
        scorer: Arc::new(FailingScorer),
        views: views(),
    });
    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({ "text": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["label"], "neutral");
    assert_eq!(body["confidence"], 0.0);
    assert!(body["ranking"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn scorer_failure_is_a_server_error() {
    let app = zero_shot_router(ZeroShotState {
        scorer: Arc::new(FailingScorer),
        views: views(),
    });
    let response = app
        .oneshot(json_request("/api/predict", serde_json::json!({ "text": "hello" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn styled_history_keeps_last_five_newest_first() {
    let app = styled_app();

    let response = app.clone().oneshot(get_request("/", None)).await.unwrap();
    assert!(!response.headers().contains_key(SET_COOKIE));

    // The first submission starts the session.
    let response = app
        .clone()
        .oneshot(form_request("/", "text=message+0", None))
        .await
        .unwrap();
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("talksense_session="));

    for n in 1..7 {
        let response = app
            .clone()
            .oneshot(form_request("/", &format!("text=message+{n}"), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(SET_COOKIE));
    }

    let html = body_text(app.clone().oneshot(get_request("/", Some(&cookie))).await.unwrap()).await;
    for n in 2..7 {
        assert!(html.contains(&format!("message {n}")), "message {n} missing");
    }
    assert!(!html.contains("message 1"));
    assert!(!html.contains("message 0"));
    let newest = html.find("message 6").unwrap();
    let oldest = html.find("message 2").unwrap();
    assert!(newest < oldest);

    // Another visitor has an empty history.
    let html = body_text(app.clone().oneshot(get_request("/", None)).await.unwrap()).await;
    assert!(html.contains("No analyses yet."));

    let response = app
        .clone()
        .oneshot(form_request("/history/clear", "", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.oneshot(get_request("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("No analyses yet."));
}

#[tokio::test]
async fn styled_display_options_are_per_session() {
    let app = styled_app();

    let response = app
        .clone()
        .oneshot(form_request("/options", "show_chart=on", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let html = body_text(
        app.clone()
            .oneshot(form_request("/", "text=thanks+a+lot", Some(&cookie)))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("grateful"));
    assert!(!html.contains("Recent analyses"));
    assert!(!html.contains("Top emotions"));
    assert!(!html.contains("🙏"));
    assert!(html.contains("class=\"chart\""));

    let html = body_text(
        app.oneshot(form_request("/", "text=thanks+a+lot", None))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("Recent analyses"));
    assert!(html.contains("🙏 grateful"));
}

#[tokio::test]
async fn page_views_do_not_create_sessions() {
    let sessions = Arc::new(SessionStore::new());
    let app = styled_app_with(sessions.clone());

    for _ in 0..50 {
        let response = app.clone().oneshot(get_request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(SET_COOKIE));
    }
    let response = app
        .clone()
        .oneshot(form_request("/history/clear", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(sessions.is_empty());

    app.oneshot(form_request("/", "text=thanks", None))
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
}
