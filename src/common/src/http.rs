use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::Response;
use bytes::Bytes;
use http_body_util::BodyExt;
use lazy_static::lazy_static;
use metrics::counter;
use metrics::histogram;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde::Serializer;
use tracing::debug;

use crate::types::METRIC_HTTP_REQUESTS_TOTAL;
use crate::types::METRIC_HTTP_REQUEST_TIME_SECONDS;

#[derive(Serialize, Debug, Clone)]
pub struct ApiError {
    #[serde(serialize_with = "serialize_http_code")]
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message.clone().unwrap_or_default())
    }
}

impl Error for ApiError {}

#[derive(Serialize)]
struct ApiErrorWrapper {
    pub error: ApiError,
}

pub fn serialize_http_code<S: Serializer>(
    status: &StatusCode,
    ser: S,
) -> std::result::Result<S::Ok, S::Error> {
    ser.serialize_u16(status.as_u16())
}

impl ApiError {
    pub fn bad_request(err: impl ToString) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST).with_message(err.to_string())
    }

    pub fn not_found(err: impl ToString) -> Self {
        ApiError::new(StatusCode::NOT_FOUND).with_message(err.to_string())
    }

    pub fn internal(err: impl ToString) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR).with_message(err.to_string())
    }

    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fields(self, fields: BTreeMap<String, String>) -> Self {
        Self {
            status: self.status,
            message: self.message,
            fields,
        }
    }

    pub fn with_message(self, message: String) -> Self {
        Self {
            status: self.status,
            message: Some(message),
            fields: self.fields,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!("ApiError: {:?}", self);
        (self.status, Json(ApiErrorWrapper { error: self })).into_response()
    }
}

/// JSON body extractor/responder whose rejections are rendered as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(v) => Ok(Json(v.0)),
            Err(err) => {
                let text = err.body_text();
                let mut api_err = ApiError::bad_request(&text);

                if matches!(err, JsonRejection::JsonDataError(_)) {
                    lazy_static! {
                        static ref FIELD_RX: Regex =
                            Regex::new(r"(\w+?) field `(.+?)`").expect("valid regex");
                    }
                    if let Some(captures) = FIELD_RX.captures(text.as_str()) {
                        api_err = api_err.with_fields(BTreeMap::from([(
                            captures[2].to_string(),
                            captures[1].to_string(),
                        )]));
                    }
                }

                Err(api_err)
            }
        }
    }
}

impl<T> IntoResponse for Json<T>
where T: Serialize
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters extractor whose rejections are rendered as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(v) => Ok(Path(v.0)),
            Err(err) => Err(ApiError::bad_request(err.body_text())),
        }
    }
}

pub async fn measure_request_response(
    req: Request,
    next: Next,
) -> std::result::Result<impl IntoResponse, (StatusCode, String)> {
    let start = Instant::now();
    let path = req.uri().path().to_string();
    let record = req.method() != Method::OPTIONS;
    let res = next.run(req).await;
    if record {
        let status = res.status().as_u16().to_string();
        histogram!(METRIC_HTTP_REQUEST_TIME_SECONDS, "path" => path.clone(), "status" => status.clone())
            .record(start.elapsed().as_secs_f64());
        counter!(METRIC_HTTP_REQUESTS_TOTAL, "path" => path, "status" => status).increment(1);
    }
    Ok(res)
}

pub async fn print_request_response(
    req: Request,
    next: Next,
) -> std::result::Result<impl IntoResponse, (StatusCode, String)> {
    debug!("{} {}", req.method(), req.uri());
    let (parts, body) = req.into_parts();
    let bytes = buffer_and_print("request", body).await?;
    let req = Request::from_parts(parts, Body::from(bytes));

    Ok(next.run(req).await)
}

async fn buffer_and_print<B>(
    direction: &str,
    body: B,
) -> std::result::Result<Bytes, (StatusCode, String)>
where
    B: axum::body::HttpBody<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("failed to read {direction} body: {err}"),
            ));
        }
    };

    if let Ok(body) = std::str::from_utf8(&bytes) {
        if !body.is_empty() {
            debug!("{direction} body = {body}");
        }
    }

    Ok(bytes)
}
