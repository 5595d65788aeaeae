//! JSON error bodies
//!
//! Handlers that have something specific to say return JSON bodies with
//! the matching status themselves. These handlers catch everything else
//! (extractor failures, `error::Error*` rejections) and rewrite the body
//! so every error response carries a `message` field.

use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::http::header;
use serde::Serialize;

/// Error payload shared by every non-2xx response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

fn render_json<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let status = res.status();

    // A handler that already produced JSON keeps its body.
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let message = status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string();

    let (req, res) = res.into_parts();
    let body = serde_json::to_string(&ErrorBody { message }).unwrap_or_default();
    let res = res.set_body(body);

    let mut res = ServiceResponse::new(req, res);
    res.response_mut().headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );

    Ok(ErrorHandlerResponse::Response(
        res.map_into_boxed_body().map_into_right_body(),
    ))
}

pub fn render_400<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_json(res)
}

pub fn render_401<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_json(res)
}

pub fn render_403<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_json(res)
}

pub fn render_404<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_json(res)
}

pub fn render_500<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render_json(res)
}
