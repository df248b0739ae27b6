//! Request dispatch and endpoint handlers

use crate::error::ApiError;
use crate::identity::IdentityResolver;
use crate::query::{parse_query, topic_filter};
use crate::router::{ApiRouter, Endpoint, RouteMatch, RouteMiss};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use mathquest_core::{
    LearningService, ProgressUpdate, Stage, StageOutcome, Storage, TopicId, UserId,
};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Storage backend chosen at startup
pub type DynStorage = Box<dyn Storage + Send + Sync>;

/// Shared server state
///
/// One lock guards the whole service so that each operation, including the
/// update-then-add-stars pair, runs without interleaving.
pub struct AppState {
    service: RwLock<LearningService<DynStorage>>,
    router: ApiRouter,
    identity: IdentityResolver,
}

/// A buffered request as seen by the handlers
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path_and_query.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// Body of `POST /api/progress/{topicId}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody {
    #[serde(default, deserialize_with = "user_id_field")]
    user_id: Option<u64>,
    #[serde(flatten)]
    update: ProgressUpdate,
}

/// Body of `POST /api/progress/{topicId}/stages/{stage}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageBody {
    #[serde(default, deserialize_with = "user_id_field")]
    user_id: Option<u64>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
}

/// `userId` as a JSON number or a numeric string
fn user_id_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid userId: {text:?}"))),
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

impl AppState {
    pub fn new(
        service: LearningService<DynStorage>,
        identity: IdentityResolver,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            service: RwLock::new(service),
            router: ApiRouter::new()?,
            identity,
        })
    }

    /// The guarded learning service
    pub fn service(&self) -> &RwLock<LearningService<DynStorage>> {
        &self.service
    }

    /// Route and handle a buffered request
    pub async fn dispatch(&self, req: ApiRequest) -> Response<Full<Bytes>> {
        debug!(method = %req.method, path = %req.path, "request");

        let result = match self.router.route(&req.method, &req.path) {
            Ok(route) => self.handle(route, &req).await,
            Err(RouteMiss::NotFound) => Err(ApiError::not_found("Not found")),
            Err(RouteMiss::MethodNotAllowed) => Err(ApiError::method_not_allowed()),
        };

        match result {
            Ok(response) => response,
            Err(err) => {
                if err.status.is_server_error() {
                    warn!(method = %req.method, path = %req.path, error = %err, "request failed");
                } else {
                    debug!(method = %req.method, path = %req.path, error = %err, "request rejected");
                }
                err.into_response()
            }
        }
    }

    async fn handle(&self, route: RouteMatch, req: &ApiRequest) -> Result<Response<Full<Bytes>>, ApiError> {
        let captures = &route.captures;

        match route.endpoint {
            Endpoint::Health => Ok(json_response(StatusCode::OK, &HealthBody { status: "ok" })),

            Endpoint::ListTopics => {
                let params = parse_query(req.query.as_deref())?;
                let filter = topic_filter(&params)?;
                let topics = self.service.read().await.topics(&filter)?;
                Ok(json_response(StatusCode::OK, &topics))
            }

            Endpoint::GetTopic => {
                let id: TopicId = capture(captures, 0)?.parse()?;
                let topic = self
                    .service
                    .read()
                    .await
                    .topic(id)?
                    .ok_or_else(|| ApiError::not_found("Topic not found"))?;
                Ok(json_response(StatusCode::OK, &topic))
            }

            Endpoint::UnlockTopic => {
                let id: TopicId = capture(captures, 0)?.parse()?;
                let user = self.identity.reader(&req.headers)?;
                let topic = self
                    .service
                    .write()
                    .await
                    .unlock_topic(id)?
                    .ok_or_else(|| ApiError::not_found("Topic not found"))?;
                info!(topic_id = %id, user_id = %user, "unlock requested");
                Ok(json_response(StatusCode::OK, &topic))
            }

            Endpoint::MyProgress => {
                let user = self.identity.reader(&req.headers)?;
                let records = self.service.read().await.all_progress(user)?;
                Ok(json_response(StatusCode::OK, &records))
            }

            Endpoint::UserProgress => {
                let user: UserId = capture(captures, 0)?.parse()?;
                let records = self.service.read().await.all_progress(user)?;
                Ok(json_response(StatusCode::OK, &records))
            }

            Endpoint::UserSummary => {
                let user: UserId = capture(captures, 0)?.parse()?;
                let summary = self.service.read().await.summary(user)?;
                Ok(json_response(StatusCode::OK, &summary))
            }

            Endpoint::GetProgress => {
                let topic: TopicId = capture(captures, 0)?.parse()?;
                let user = self.identity.reader(&req.headers)?;
                let progress = self.service.read().await.progress(user, topic)?;
                Ok(json_response(StatusCode::OK, &progress))
            }

            Endpoint::UpdateProgress => {
                let topic: TopicId = capture(captures, 0)?.parse()?;
                let body: UpdateBody = parse_body(&req.body)?;
                let user = self.identity.writer(&req.headers, body.user_id)?;
                let progress = self
                    .service
                    .write()
                    .await
                    .update_progress(user, topic, &body.update)?;
                Ok(json_response(StatusCode::OK, &progress))
            }

            Endpoint::CompleteStage => {
                let topic: TopicId = capture(captures, 0)?.parse()?;
                let stage: Stage = capture(captures, 1)?.parse()?;
                let body: StageBody = parse_body(&req.body)?;
                let user = self.identity.writer(&req.headers, body.user_id)?;
                let outcome = StageOutcome {
                    score: body.score,
                    total: body.total,
                };
                let completion = self
                    .service
                    .write()
                    .await
                    .complete_stage(user, topic, stage, &outcome)?;
                Ok(json_response(StatusCode::OK, &completion))
            }

            Endpoint::CurrentUser => {
                let id = self.identity.reader(&req.headers)?;
                let user = self
                    .service
                    .read()
                    .await
                    .user(id)?
                    .ok_or_else(|| ApiError::not_found("User not found"))?;
                Ok(json_response(StatusCode::OK, &user))
            }
        }
    }
}

/// hyper service entry point
pub async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Ok(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_response());
        }
        Err(e) => {
            return Ok(ApiError::bad_request(format!("Failed to read body: {e}")).into_response());
        }
    };

    let request = ApiRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(|q| q.to_string()),
        headers: parts.headers,
        body,
    };
    Ok(state.dispatch(request).await)
}

fn capture(captures: &[String], index: usize) -> Result<&str, ApiError> {
    captures
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| ApiError::internal("Route capture missing"))
}

/// Parse a JSON body; an empty body reads as `{}`
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, json) = match serde_json::to_vec(body) {
        Ok(json) => (status, json),
        Err(e) => {
            warn!(error = %e, "response serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"message":"Serialization failed"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
