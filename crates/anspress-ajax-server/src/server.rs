//! HTTP front end.
//!
//! The caller is whoever the `x-ap-user` header names. Nothing here
//! authenticates that header: both `/ajax` and `/nonce` trust it, so a nonce
//! only proves the request came from a client that fetched `/nonce` with the
//! same header. Put an authenticating proxy in front before exposing this.

use crate::actions;
use crate::board::SharedBoard;
use crate::config::Config;
use anspress_ajax_core::{
    ACTION_PARAM, ActionRegistry, AjaxRequest, Caller, DEFAULT_NONCE_KEY, Envelope, HmacNonces,
    Services,
};
use axum::{
    Json, Router,
    extract::{Form, Query, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Header carrying the caller, `user:<id>`. Absent means anonymous.
/// Trusted as sent; see the module docs.
pub const USER_HEADER: &str = "x-ap-user";

pub struct AppState {
    registry: ActionRegistry,
    services: Services,
    nonces: Arc<HmacNonces>,
}

impl AppState {
    pub fn new(config: &Config, board: &SharedBoard) -> anyhow::Result<Self> {
        let nonces = Arc::new(config.nonces()?);
        let services = Services::new(nonces.clone())
            .with_translator(config.catalog())
            .with_hook(|ctx| {
                tracing::debug!(
                    action = %ctx.action(),
                    caller = %ctx.caller(),
                    success = ctx.is_success(),
                    form_errors = ctx.form_errors().len(),
                    "sending response"
                );
            });
        Ok(Self {
            registry: actions::registry(board)?,
            services,
            nonces,
        })
    }
}

type SharedState = Arc<AppState>;
type Rejection = (StatusCode, Json<Value>);

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/ajax", get(ajax_query).post(ajax_form))
        .route("/nonce", get(create_nonce))
        .route("/actions", get(list_actions))
        .with_state(state)
}

pub async fn run(config: Config, board: SharedBoard) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(&config, &board)?);
    tracing::info!(actions = state.registry.len(), "action registry ready");

    let app = router(state);
    tracing::info!("Listening on http://{}", config.listen);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn rejection(action: Option<&str>, message: impl Into<String>) -> Rejection {
    rejection_with(StatusCode::BAD_REQUEST, action, message)
}

fn rejection_with(status: StatusCode, action: Option<&str>, message: impl Into<String>) -> Rejection {
    (
        status,
        Json(json!({
            "form_errors": {},
            "success": false,
            "action": action,
            "snackbar": { "message": message.into() },
        })),
    )
}

fn caller(headers: &HeaderMap) -> Result<Caller, Rejection> {
    let Some(value) = headers.get(USER_HEADER) else {
        return Ok(Caller::Anonymous);
    };
    value
        .to_str()
        .map_err(|e| e.to_string())
        .and_then(|s| s.parse::<Caller>().map_err(|e| e.to_string()))
        .map_err(|e| rejection(None, e))
}

fn answer(
    state: &AppState,
    headers: &HeaderMap,
    params: impl IntoIterator<Item = (String, String)>,
) -> Result<Json<Envelope>, Rejection> {
    let request = AjaxRequest::from_pairs(caller(headers)?, params);
    let Some(action) = request.action().map(str::to_owned) else {
        return Err(rejection(None, "Missing action."));
    };

    state
        .registry
        .dispatch(&action, request, &state.services)
        .map(Json)
        .map_err(|e| {
            tracing::warn!("{}", e);
            rejection(Some(&action), e.to_string())
        })
}

/// GET /ajax - parameters from the query string
async fn ajax_query(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Envelope>, Rejection> {
    answer(&state, &headers, params)
}

/// POST /ajax - form body, merged over the query string. A POST without a
/// `Content-Type` is answered from the query string alone.
async fn ajax_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<Envelope>, Rejection> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(_) if !headers.contains_key(header::CONTENT_TYPE) => HashMap::new(),
        Err(e) => {
            let action = query.get(ACTION_PARAM).map(String::as_str);
            return Err(rejection_with(e.status(), action, e.body_text()));
        }
    };
    answer(&state, &headers, query.into_iter().chain(form))
}

#[derive(Deserialize)]
struct NonceParams {
    key: Option<String>,
}

/// GET /nonce - mint a nonce for the caller
async fn create_nonce(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<NonceParams>,
) -> Result<Json<Value>, Rejection> {
    let caller = caller(&headers)?;
    let key = params
        .key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_NONCE_KEY.to_string());
    let nonce = state.nonces.create(&key, &caller);
    Ok(Json(json!({ "key": key, "nonce": nonce })))
}

/// GET /actions - registered action names
async fn list_actions(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.registry.names().map(str::to_owned).collect())
}
