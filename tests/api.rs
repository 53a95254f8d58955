use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use college_admission_assistant::api::{create_api, AppState, RecommendationResponse};
use college_admission_assistant::llm::{ExplanationService, SemanticSearch};
use college_admission_assistant::providers::{CompletionProvider, TextStream};
use college_admission_assistant::{build_index, AdmissionChance, Catalog};
use futures::stream;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct ScriptedProvider {
    fragments: Vec<Result<String, String>>,
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("Strong fit for your rank and budget.".to_string())
    }

    async fn stream_chat(&self, _system_prompt: &str, _user_message: &str) -> Result<TextStream> {
        let fragments: Vec<Result<String>> = self
            .fragments
            .iter()
            .cloned()
            .map(|f| f.map_err(|e| anyhow!(e)))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }

    async fn get_model_info(&self) -> Result<String> {
        Ok("scripted".to_string())
    }
}

fn app(provider: Option<ScriptedProvider>) -> Router {
    let catalog = Arc::new(Catalog::bundled().unwrap());
    let store = Arc::new(build_index(catalog.colleges()));
    let provider = provider.map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);
    let explainer = Arc::new(ExplanationService::new(
        provider.clone(),
        SemanticSearch::new(store.clone()),
    ));
    create_api(AppState::new(catalog, store, explainer, provider))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn chat_request() -> Value {
    json!({
        "college": {
            "college_name": "IIT Bombay",
            "state": "Maharashtra",
            "course": "BTech",
            "exam": "JEE",
            "matchScore": 88,
            "admissionChance": "Safe"
        },
        "student_rank": 900,
        "student_budget": 300000,
        "system_prompt": "You are an admission counselor.",
        "user_message": "How are the hostels?"
    })
}

#[tokio::test]
async fn health_reports_catalog_and_vocabulary() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = body_text(app(None), request).await;
    assert_eq!(status, StatusCode::OK);

    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["colleges_loaded"], 100);
    assert!(health["vocabulary_size"].as_u64().unwrap() > 0);
    assert!(health["model"].is_null());

    let provider = ScriptedProvider { fragments: vec![] };
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, body) = body_text(app(Some(provider)), request).await;
    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["model"], "scripted");
}

#[tokio::test]
async fn meta_lists_courses_per_exam() {
    let request = Request::builder().uri("/meta").body(Body::empty()).unwrap();
    let (status, body) = body_text(app(None), request).await;
    assert_eq!(status, StatusCode::OK);

    let meta: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(meta["courses"]["NEET"], json!(["MBBS"]));
    assert!(meta["exams"].as_array().unwrap().contains(&json!("CUET")));
}

#[tokio::test]
async fn recommendations_use_provider_explanations() {
    let provider = ScriptedProvider { fragments: vec![] };
    let request = post_json(
        "/recommendations",
        json!({ "exam": "JEE", "rank": 5000, "budgetMax": 300000, "course": "BTech", "useAI": true }),
    );
    let (status, body) = body_text(app(Some(provider)), request).await;
    assert_eq!(status, StatusCode::OK);

    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert!(response.total_filtered >= response.results.len());
    assert!(!response.results.is_empty());
    assert!(response.results.len() <= 10);
    assert!(response
        .results
        .iter()
        .all(|r| r.explanation == "Strong fit for your rank and budget."));
    assert!(response
        .results
        .windows(2)
        .all(|w| w[0].match_score >= w[1].match_score));
    assert!(response.student_summary.starts_with(&format!(
        "Found {} eligible colleges from 100 in our database.",
        response.total_filtered
    )));

    let raw: Value = serde_json::from_str(&body).unwrap();
    let first = &raw["results"][0];
    assert!(first["college_name"].is_string());
    assert!(first["matchScore"].is_u64());
}

#[tokio::test]
async fn recommendations_fall_back_without_provider() {
    let request = post_json(
        "/recommendations",
        json!({ "exam": "NEET", "rank": 100, "budgetMax": 2000000, "course": "MBBS" }),
    );
    let (status, body) = body_text(app(None), request).await;
    assert_eq!(status, StatusCode::OK);

    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    let first = &response.results[0];
    assert_eq!(first.admission_chance, AdmissionChance::Safe);
    assert!(first.explanation.starts_with("Your rank (100) is comfortably within"));
}

#[tokio::test]
async fn recommendations_reject_invalid_rank() {
    let request = post_json(
        "/recommendations",
        json!({ "exam": "JEE", "rank": 0, "budgetMax": 300000, "course": "BTech" }),
    );
    let (status, _) = body_text(app(None), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn recommendations_empty_result_has_summary() {
    let request = post_json(
        "/recommendations",
        json!({ "exam": "NEET", "rank": 100, "budgetMax": 300000, "course": "BTech" }),
    );
    let (status, body) = body_text(app(None), request).await;
    assert_eq!(status, StatusCode::OK);

    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.total_filtered, 0);
    assert!(response.results.is_empty());
    assert!(response.student_summary.starts_with("No colleges found"));
}

#[tokio::test]
async fn chat_stream_relays_fragments_then_done() {
    let provider = ScriptedProvider {
        fragments: vec![Ok("The hostels ".to_string()), Ok("are good.".to_string())],
    };
    let (status, body) = body_text(app(Some(provider)), post_json("/chat/stream", chat_request())).await;
    assert_eq!(status, StatusCode::OK);

    let first = body.find(r#"{"choices":[{"delta":{"content":"The hostels "}}]}"#).unwrap();
    let second = body.find(r#"{"choices":[{"delta":{"content":"are good."}}]}"#).unwrap();
    let done = body.find("data: [DONE]").unwrap();
    assert!(first < second && second < done);
}

#[tokio::test]
async fn chat_stream_disables_proxy_buffering() {
    let response = app(None)
        .oneshot(post_json("/chat/stream", chat_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-accel-buffering"], "no");
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
}

#[tokio::test]
async fn chat_stream_reports_errors_in_band() {
    let provider = ScriptedProvider {
        fragments: vec![Ok("Partial".to_string()), Err("connection reset".to_string())],
    };
    let (_, body) = body_text(app(Some(provider)), post_json("/chat/stream", chat_request())).await;
    assert!(body.contains("Partial"));
    assert!(body.contains("[Error: connection reset]"));
    assert!(body.ends_with("data: [DONE]\n\n"));

    let (status, body) = body_text(app(None), post_json("/chat/stream", chat_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("[Error: No language model configured]"));
    assert!(body.contains("data: [DONE]"));
}

#[tokio::test]
async fn chat_stream_rejects_empty_message() {
    let mut request = chat_request();
    request["user_message"] = json!("");
    let (status, _) = body_text(app(None), post_json("/chat/stream", request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
