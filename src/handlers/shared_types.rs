use crate::error::ServiceError;
use crate::services::ItemResultStream;
use crate::wire::{ApiResponse, StreamFrame};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Serialize;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Unwraps a JSON body, reporting a malformed one as a validation error.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    // ---
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::validation(rejection.body_text()))
}

/// Streams items as NDJSON frames. A failure becomes one terminal error frame.
pub(crate) fn ndjson_response(items: ItemResultStream) -> Response {
    // ---
    let lines = items
        .scan(false, |finished, result| {
            if *finished {
                return futures::future::ready(None);
            }
            let frame = match result {
                Ok(item) => StreamFrame::Item(item),
                Err(err) => {
                    *finished = true;
                    if let ServiceError::Store(cause) = &err {
                        tracing::error!("Scan aborted: {:?}", cause);
                    }
                    StreamFrame::Error(err.to_body())
                }
            };
            futures::future::ready(Some(frame))
        })
        .map(|frame| {
            serde_json::to_vec(&frame).map(|mut line| {
                line.push(b'\n');
                line
            })
        });

    ([(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)], Body::from_stream(lines)).into_response()
}
