//! HTTP surface: one webhook per call state, the ticket status query, and
//! the boundary that turns every fault into playable markup.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::call_flow::{self, CallInput, CallState, Renderer};
use crate::error::{IvrError, StoreError};
use crate::store::TicketStore;
use crate::twiml::{VoiceResponse, CONTENT_TYPE};

/// Shared, read-only state handed to every request.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub renderer: Arc<Renderer>,
    pub lookup_timeout: Duration,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            renderer: Arc::clone(&self.renderer),
            lookup_timeout: self.lookup_timeout,
        }
    }
}

impl<S> AppState<S> {
    pub fn new(store: S, renderer: Renderer, lookup_timeout: Duration) -> Self {
        Self {
            store: Arc::new(store),
            renderer: Arc::new(renderer),
            lookup_timeout,
        }
    }
}

/// Voice markup returned with the carrier's content type.
#[derive(Debug)]
pub struct Twiml(pub VoiceResponse);

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, CONTENT_TYPE)], self.0.render()).into_response()
    }
}

/// Build the router with every call-flow endpoint and the status query.
pub fn app<S: TicketStore + 'static>(state: AppState<S>) -> Router {
    let renderer = Arc::clone(&state.renderer);
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ticket_status/{ticket_id}", get(ticket_status::<S>));

    for call_state in CallState::ALL {
        let handler = move |State(app): State<AppState<S>>,
                            form: Result<Form<CallInput>, FormRejection>| {
            call_endpoint(call_state, app, form)
        };
        router = router.route(
            call_state.path(),
            get(handler.clone())
                .post(handler)
                .layer(catch_panics(Arc::clone(&renderer), Some(call_state))),
        );
    }

    router
        .layer(catch_panics(renderer, None))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "webhook",
                method = %request.method(),
                path = %request.uri().path(),
                call_state = ?CallState::from_path(request.uri().path()),
                request_id = %Uuid::new_v4(),
            )
        }))
        .with_state(state)
}

async fn root() -> &'static str {
    "The DIGI9 IVR Brain is running!"
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn call_endpoint<S: TicketStore>(
    call_state: CallState,
    app: AppState<S>,
    form: Result<Form<CallInput>, FormRejection>,
) -> Twiml {
    // Carrier fields are optional; an unreadable body counts as no input.
    let input = match form {
        Ok(Form(input)) => input,
        Err(rejection) => {
            let fault = IvrError::MalformedInput(rejection.body_text());
            tracing::warn!(
                endpoint = call_state.path(),
                state = %call_state,
                error = %fault,
                "unreadable webhook fields, treating input as absent"
            );
            CallInput::default()
        }
    };

    let result = call_flow::respond(call_state, &input, app.store.as_ref(), app.lookup_timeout)
        .await
        .and_then(|step| {
            tracing::debug!(state = %call_state, spoken = %step.spoken_text(), "call flow step");
            app.renderer.render(&step)
        });
    Twiml(answer(&app.renderer, call_state, &input, result))
}

/// The single fault boundary: successful markup passes through, every error
/// is logged and replaced by an apology that ends the call cleanly.
fn answer(
    renderer: &Renderer,
    call_state: CallState,
    input: &CallInput,
    result: Result<VoiceResponse, IvrError>,
) -> VoiceResponse {
    match result {
        Ok(response) => {
            tracing::debug!(
                endpoint = call_state.path(),
                state = %call_state,
                verbs = response.verbs().len(),
                "answered webhook"
            );
            response
        }
        Err(err) => {
            tracing::error!(
                endpoint = call_state.path(),
                state = %call_state,
                digits = ?input.digits,
                speech = ?input.speech,
                error = %err,
                "call flow fault, answering with apology"
            );
            renderer.apology(Some(call_state), &err)
        }
    }
}

/// Catch handler panics and answer with the apology for `call_state`.
fn catch_panics(
    renderer: Arc<Renderer>,
    call_state: Option<CallState>,
) -> CatchPanicLayer<impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static>
{
    CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
        panic_response(&renderer, call_state, err)
    })
}

fn panic_response(
    renderer: &Renderer,
    call_state: Option<CallState>,
    err: Box<dyn Any + Send + 'static>,
) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(
        endpoint = call_state.map_or("-", |s| s.path()),
        panic = detail,
        "handler panicked, answering with apology"
    );
    let fault = IvrError::InternalFault(format!("handler panicked: {detail}"));
    Twiml(renderer.apology(call_state, &fault)).into_response()
}

async fn ticket_status<S: TicketStore>(
    State(app): State<AppState<S>>,
    Path(ticket_id): Path<String>,
) -> String {
    status_line(app.store.as_ref(), &ticket_id, app.lookup_timeout).await
}

/// One human-readable line describing the ticket's status.
///
/// Never fails: store faults are logged and reported in the text.
pub async fn status_line<S: TicketStore>(store: &S, ticket_id: &str, timeout: Duration) -> String {
    match tokio::time::timeout(timeout, store.lookup(ticket_id)).await {
        Ok(Ok(Some(status))) => format!("Status for ticket {ticket_id}: {status}"),
        Ok(Ok(None)) => format!("Ticket {ticket_id} not found."),
        Ok(Err(StoreError::Unconfigured(reason))) => {
            tracing::error!(ticket_id, reason = %reason, "ticket store not initialized");
            "Ticket store not initialized properly.".to_string()
        }
        Ok(Err(e)) => {
            tracing::error!(ticket_id, error = %e, "ticket status lookup failed");
            "Sorry, an error occurred while fetching the ticket status.".to_string()
        }
        Err(_) => {
            tracing::error!(ticket_id, timeout_ms = timeout.as_millis() as u64, "ticket status lookup timed out");
            "Sorry, an error occurred while fetching the ticket status.".to_string()
        }
    }
}
