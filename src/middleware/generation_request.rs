use axum::{
    Json, RequestExt,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiErrorResponse;
use crate::types::{GenerateBody, GenerationRequest, ModelQuery};

/// Extracts `{ prompt, model? }` plus the `?model=` override into one request.
pub struct GenerationPreprocess(pub GenerationRequest);

impl<S> FromRequest<S> for GenerationPreprocess
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(mut req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = match req.extract_parts::<Query<ModelQuery>>().await {
            Ok(q) => q,
            Err(rejection) => return Err(reject(rejection.status(), rejection.body_text())),
        };

        // Any content type; an unusable body becomes an empty prompt.
        let bytes = match Bytes::from_request(req, &()).await {
            Ok(b) => b,
            Err(rejection) => return Err(reject(rejection.status(), rejection.body_text())),
        };
        let body = GenerateBody::from_slice_lenient(&bytes);

        Ok(GenerationPreprocess(GenerationRequest::merge(body, query)))
    }
}

fn reject(status: StatusCode, message: String) -> Response {
    (status, Json(ApiErrorResponse::new(message))).into_response()
}
