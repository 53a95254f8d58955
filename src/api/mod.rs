use async_stream::stream;
use axum::{
    extract::State,
    http::{HeaderName, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::catalog::{Catalog, CatalogMeta, CollegeRecord};
use crate::database::VectorStore;
use crate::llm::ExplanationService;
use crate::providers::traits::CompletionProvider;
use crate::recommend::{recommend, AdmissionChance, RecommendError, StudentPreferences};

const MAX_CONCURRENT_REQUESTS: usize = 64;

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
    store: Arc<VectorStore>,
    explainer: Arc<ExplanationService>,
    chat: Option<Arc<dyn CompletionProvider>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<VectorStore>,
        explainer: Arc<ExplanationService>,
        chat: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self {
            catalog,
            store,
            explainer,
            chat,
        }
    }
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    colleges_loaded: usize,
    vocabulary_size: usize,
    model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendedCollege {
    #[serde(flatten)]
    pub college: CollegeRecord,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    #[serde(rename = "admissionChance")]
    pub admission_chance: AdmissionChance,
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub total_filtered: usize,
    pub results: Vec<RecommendedCollege>,
    pub student_summary: String,
}

/// The college a chat is about, as the frontend sends it back.
#[derive(Debug, Deserialize)]
pub struct CollegeInfo {
    pub college_name: String,
    pub state: String,
    pub course: String,
    pub exam: String,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    #[serde(rename = "admissionChance")]
    pub admission_chance: AdmissionChance,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatStreamRequest {
    pub college: CollegeInfo,
    pub student_rank: Option<i64>,
    pub student_budget: Option<i64>,
    #[validate(length(min = 1))]
    pub system_prompt: String,
    #[validate(length(min = 1, max = 4000))]
    pub user_message: String,
}

type ApiError = (StatusCode, Json<ApiResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ApiResponse {
            status: message.into(),
        }),
    )
}

/// Create and configure the API router
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/meta", get(meta_handler))
        .route("/recommendations", post(recommendations_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "College Admission Assistant API",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = match &state.chat {
        Some(provider) => provider.get_model_info().await.ok(),
        None => None,
    };

    Json(HealthResponse {
        status: "ok",
        colleges_loaded: state.catalog.len(),
        vocabulary_size: state.store.vocabulary().len(),
        model,
    })
}

async fn meta_handler(State(state): State<AppState>) -> Json<CatalogMeta> {
    Json(state.catalog.meta())
}

async fn recommendations_handler(
    State(state): State<AppState>,
    Json(prefs): Json<StudentPreferences>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    if let Err(e) = prefs.validate() {
        return Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }

    let recommendation = recommend(state.catalog.colleges(), &prefs).map_err(|e| match e {
        RecommendError::InvalidPreferences(_) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    })?;

    log::info!(
        "{} eligible colleges for {} {} rank {}",
        recommendation.total_filtered,
        prefs.exam,
        prefs.course,
        prefs.rank
    );

    let summary = recommendation.summary(state.catalog.len());
    let explanations = state
        .explainer
        .explain_all(&recommendation.candidates, &prefs)
        .await;

    let results = recommendation
        .candidates
        .into_iter()
        .zip(explanations)
        .map(|(candidate, explanation)| RecommendedCollege {
            college: candidate.college,
            match_score: candidate.match_score,
            admission_chance: candidate.admission_chance,
            explanation,
        })
        .collect();

    Ok(Json(RecommendationResponse {
        total_filtered: recommendation.total_filtered,
        results,
        student_summary: summary,
    }))
}

fn delta_event(content: &str) -> Event {
    Event::default().data(json!({ "choices": [{ "delta": { "content": content } }] }).to_string())
}

async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatStreamRequest>,
) -> Response {
    if let Err(e) = request.validate() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
    }

    log::info!(
        "Chat about {} ({} {} via {}, {} / {}) rank {:?} budget {:?}",
        request.college.college_name,
        request.college.state,
        request.college.course,
        request.college.exam,
        request.college.match_score,
        request.college.admission_chance,
        request.student_rank,
        request.student_budget,
    );

    let provider = state.chat.clone();
    let events = stream! {
        let fragments = match provider {
            Some(provider) => provider
                .stream_chat(&request.system_prompt, &request.user_message)
                .await,
            None => Err(anyhow::anyhow!("No language model configured")),
        };

        match fragments {
            Ok(mut fragments) => {
                while let Some(fragment) = fragments.next().await {
                    match fragment {
                        Ok(content) => {
                            yield Ok::<Event, Infallible>(delta_event(&content));
                        }
                        Err(e) => {
                            log::warn!("Chat stream interrupted: {}", e);
                            yield Ok(delta_event(&format!("\n\n[Error: {}]", e)));
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("Chat stream failed to start: {}", e);
                yield Ok(delta_event(&format!("\n\n[Error: {}]", e)));
            }
        }

        yield Ok(Event::default().data("[DONE]"));
    };

    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));

    // Stops nginx from buffering the stream.
    ([(HeaderName::from_static("x-accel-buffering"), "no")], sse).into_response()
}
