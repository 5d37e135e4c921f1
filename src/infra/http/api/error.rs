use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use layoutgen_api_types::ErrorBody;
use serde_json::Value;

use crate::{
    application::{
        catalog::CatalogServiceError, error::ErrorReport, generation::GenerationError,
        render::RenderError,
    },
    domain::{catalog::CatalogKind, validation::ValidationError},
};

/// Seconds a client should wait before retrying a saturated render pool.
pub const RETRY_AFTER_SECS: u64 = 5;

pub mod messages {
    pub const INVALID_CONFIG: &str = "Invalid config format";
    pub const CLASSIFICATION_FAILED: &str = "Classification failed";
    pub const GENERATION_FAILED: &str = "Generation failed";
    pub const RENDER_BUSY: &str = "Render capacity exhausted";
    pub const SLIDE_NOT_FOUND: &str = "Slide not found";
    pub const INFOGRAPHIC_NOT_FOUND: &str = "Infographic not found";
    pub const SLIDES_UNAVAILABLE: &str = "Failed to load slide data";
    pub const INFOGRAPHICS_UNAVAILABLE: &str = "Failed to load infographic data";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: Option<Value>,
    retry_after: Option<u64>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        error: &'static str,
        details: Option<Value>,
        report_detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error,
            details,
            retry_after: None,
            report: ErrorReport::from_message(source, status, report_detail),
        }
    }

    fn from_error(
        source: &'static str,
        status: StatusCode,
        error: &'static str,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        Self {
            status,
            error,
            details: Some(Value::String(err.to_string())),
            retry_after: None,
            report: ErrorReport::from_error(source, status, err),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn invalid_config(source: &'static str, err: &ValidationError) -> Self {
        let details = serde_json::to_value(&err.violations).ok();
        let summary = err
            .violations
            .iter()
            .map(|violation| format!("{}: {}", violation.path, violation.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(
            source,
            StatusCode::BAD_REQUEST,
            messages::INVALID_CONFIG,
            details,
            summary,
        )
    }

    pub fn from_generation(source: &'static str, err: GenerationError) -> Self {
        match &err {
            GenerationError::Validation(validation) => Self::invalid_config(source, validation),
            GenerationError::Classification(_) => Self::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::CLASSIFICATION_FAILED,
                &err,
            ),
            GenerationError::Render(RenderError::Saturated { .. }) => {
                let mut api = Self::from_error(
                    source,
                    StatusCode::SERVICE_UNAVAILABLE,
                    messages::RENDER_BUSY,
                    &err,
                );
                api.retry_after = Some(RETRY_AFTER_SECS);
                api
            }
            GenerationError::Staging(_) | GenerationError::Render(_) => Self::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::GENERATION_FAILED,
                &err,
            ),
        }
    }

    pub fn from_catalog(source: &'static str, kind: CatalogKind, err: CatalogServiceError) -> Self {
        match &err {
            CatalogServiceError::NotFound { .. } => {
                let message = match kind {
                    CatalogKind::Slides => messages::SLIDE_NOT_FOUND,
                    CatalogKind::Infographics => messages::INFOGRAPHIC_NOT_FOUND,
                };
                Self::new(source, StatusCode::NOT_FOUND, message, None, err.to_string())
            }
            CatalogServiceError::Catalog(inner) => {
                let message = match kind {
                    CatalogKind::Slides => messages::SLIDES_UNAVAILABLE,
                    CatalogKind::Infographics => messages::INFOGRAPHICS_UNAVAILABLE,
                };
                let mut api = Self::from_error(
                    source,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                    inner,
                );
                api.details = None;
                api
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.to_string(),
            details: self.details,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(value) = self
            .retry_after
            .and_then(|secs| HeaderValue::from_str(&secs.to_string()).ok())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        self.report.attach(&mut response);
        response
    }
}
