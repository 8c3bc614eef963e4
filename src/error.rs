use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Failed to rasterize image: {0}")]
    ImageDecode(String),

    /// The re-encoding surface (PNG/BMP encoder) could not produce output
    #[error("Failed to encode processed image: {0}")]
    RasterEncode(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    /// The request body hit the upload limit before the file was read
    #[error("Request body too large (max upload: {max} bytes)")]
    RequestTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    pub fn status(&self) -> StatusCode {
        match self {
            OcrError::UnreadableFile(_)
            | OcrError::UnsupportedLanguage(_)
            | OcrError::MissingFile
            | OcrError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OcrError::ImageTooLarge { .. } | OcrError::RequestTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            OcrError::Recognition(_) => StatusCode::BAD_GATEWAY,
            OcrError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OcrError::ImageDecode(_) | OcrError::RasterEncode(_) | OcrError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            OcrError::UnreadableFile(_) => "UNREADABLE_FILE",
            OcrError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            OcrError::RasterEncode(_) => "RASTER_ENCODE_ERROR",
            OcrError::Recognition(_) => "RECOGNITION_ERROR",
            OcrError::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            OcrError::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
            OcrError::ImageTooLarge { .. } | OcrError::RequestTooLarge { .. } => {
                "IMAGE_TOO_LARGE"
            }
            OcrError::MissingFile => "MISSING_FILE",
            OcrError::InvalidRequest(_) => "INVALID_REQUEST",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (self.status(), body).into_response()
    }
}
