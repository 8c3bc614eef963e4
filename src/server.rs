use crate::config::Config;
use crate::engines;
use crate::error::OcrError;
use crate::image_loader;
use crate::language::Language;
use crate::preprocessing::{Filter, StepTiming};
use crate::recognition::{RecognitionOptions, Recognizer};
use crate::ui::{self, Page, ViewState};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Room for the non-file form fields on top of the upload itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recognizer: Arc<Recognizer>,
    pub config: Arc<Config>,
}

/// OCR response
#[derive(Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub confidence: Option<f32>,
    pub language: Language,
    pub filter: Filter,
    pub width: u32,
    pub height: u32,
    pub processing_time_ms: u64,
    pub preprocessing: PreprocessingInfo,
    pub engine: String,
}

#[derive(Serialize)]
pub struct PreprocessingInfo {
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct LanguageInfo {
    pub tag: &'static str,
    pub label: &'static str,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub engine_description: String,
    pub available_engines: Vec<String>,
    pub supported_languages: Vec<LanguageInfo>,
    pub max_file_size_bytes: usize,
    pub default_language: Language,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let factory = engines::build(&config)?;
    let recognizer = Recognizer::new(factory, config.max_concurrent_recognitions);
    let addr = format!("{}:{}", config.host, config.port);

    let app = router(AppState {
        recognizer: Arc::new(recognizer),
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Largest body a form may send: the upload either as a file part or, when
/// the page is resubmitted, as a base64 data URI
fn body_limit(max_file_size: usize) -> usize {
    max_file_size.div_ceil(3) * 4 + FORM_OVERHEAD_BYTES
}

pub fn router(state: AppState) -> Router {
    let body_limit = body_limit(state.config.max_file_size);

    Router::new()
        .route("/", get(handle_index).post(handle_page_recognize))
        .route("/ocr", post(handle_ocr))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields of the upload form shared by the page and the JSON API
#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    /// Previous upload carried by the page as a data URI
    image_data: Option<String>,
    language: Option<String>,
    binarize: bool,
}

impl UploadForm {
    async fn parse(mut multipart: Multipart, max_file_size: usize) -> Result<Self, OcrError> {
        let mut form = UploadForm::default();
        let fail = |context: &str, e: MultipartError| multipart_error(context, e, max_file_size);

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| fail("Failed to parse multipart", e))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "file" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| fail("Failed to read file data", e))?;
                    // An empty file input is submitted as a zero-length part
                    if !data.is_empty() {
                        form.file = Some(data);
                    }
                }
                "image_data" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| fail("Failed to read image data", e))?;
                    if !value.trim().is_empty() {
                        form.image_data = Some(value);
                    }
                }
                "language" => {
                    form.language = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| fail("Invalid language", e))?,
                    );
                }
                "binarize" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| fail("Invalid binarize flag", e))?;
                    form.binarize = parse_flag(&value);
                }
                _ => {
                    // Ignore unknown fields
                }
            }
        }

        Ok(form)
    }

    fn options(&self, default_language: Language) -> Result<RecognitionOptions, OcrError> {
        let language = match self.language.as_deref() {
            Some(tag) if !tag.trim().is_empty() => tag.parse()?,
            _ => default_language,
        };
        Ok(RecognitionOptions {
            language,
            binarize: self.binarize,
        })
    }

    /// Take the upload, enforcing the configured size limit. A freshly
    /// attached file wins over a carried data URI.
    fn take_file(&mut self, max_file_size: usize) -> Result<Vec<u8>, OcrError> {
        let data = match (self.file.take(), self.image_data.take()) {
            (Some(file), _) => file.to_vec(),
            (None, Some(uri)) => image_loader::decode_data_uri(&uri)?,
            (None, None) => return Err(OcrError::MissingFile),
        };
        if data.len() > max_file_size {
            return Err(OcrError::ImageTooLarge {
                size: data.len(),
                max: max_file_size,
            });
        }
        Ok(data)
    }
}

/// Map a multipart failure, keeping the body limit distinct from malformed input
fn multipart_error(context: &str, err: MultipartError, max_file_size: usize) -> OcrError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OcrError::RequestTooLarge { max: max_file_size }
    } else {
        OcrError::InvalidRequest(format!("{}: {}", context, err))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Handle the idle page
async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(Page::idle(state.config.default_language).render())
}

/// Handle a form submission from the page and render the outcome
async fn handle_page_recognize(State(state): State<AppState>, multipart: Multipart) -> Response {
    // Each submission is its own page, so it always starts from Loading
    let mut page = Page::idle(state.config.default_language);
    let loading = ViewState::Loading;

    let status = match recognize_for_page(&state, multipart, &mut page).await {
        Ok(text) => {
            page.state = loading.finish(Ok(text));
            StatusCode::OK
        }
        Err(e) => {
            tracing::warn!("Page request failed: {}", e);
            page.state = loading.finish(Err(page_message(&e)));
            e.status()
        }
    };

    (status, Html(page.render())).into_response()
}

/// Load the upload into `page` (options, preview) and run recognition
async fn recognize_for_page(
    state: &AppState,
    multipart: Multipart,
    page: &mut Page,
) -> Result<String, OcrError> {
    let mut form = UploadForm::parse(multipart, state.config.max_file_size).await?;
    page.options = form.options(state.config.default_language)?;
    let data = form.take_file(state.config.max_file_size)?;

    let source = image_loader::load_async(data).await?;
    page.preview = Some(source.data_uri());

    let recognition = state.recognizer.recognize(Arc::new(source), page.options).await?;
    Ok(recognition.text)
}

/// Message shown in the page. Request mistakes are explained; everything
/// that goes wrong inside preprocessing or recognition collapses into one
/// generic message.
fn page_message(err: &OcrError) -> String {
    match err {
        OcrError::UnreadableFile(_) => ui::UNREADABLE_FILE.to_string(),
        OcrError::MissingFile
        | OcrError::ImageTooLarge { .. }
        | OcrError::RequestTooLarge { .. }
        | OcrError::UnsupportedLanguage(_)
        | OcrError::InvalidRequest(_) => err.to_string(),
        _ => ui::GENERIC_ERROR.to_string(),
    }
}

/// Handle OCR requests from API clients
async fn handle_ocr(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let mut form = UploadForm::parse(multipart, state.config.max_file_size).await?;
    let options = form.options(state.config.default_language)?;
    let data = form.take_file(state.config.max_file_size)?;

    let source = image_loader::load_async(data).await?;
    let recognition = state.recognizer.recognize(Arc::new(source), options).await?;

    Ok(Json(OcrResponse {
        text: recognition.text,
        confidence: recognition.confidence,
        language: recognition.language,
        filter: recognition.filter,
        width: recognition.width,
        height: recognition.height,
        processing_time_ms: recognition.processing_time_ms,
        preprocessing: PreprocessingInfo {
            total_time_ms: recognition.preprocessing_time_ms,
            steps: recognition.preprocessing_steps,
        },
        engine: state.recognizer.engine_name().to_string(),
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.recognizer.engine_name().to_string(),
        engine_description: state.recognizer.engine_description().to_string(),
        available_engines: engines::available()
            .into_iter()
            .map(String::from)
            .collect(),
        supported_languages: Language::ALL
            .into_iter()
            .map(|lang| LanguageInfo {
                tag: lang.tag(),
                label: lang.label(),
            })
            .collect(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language,
    })
}
