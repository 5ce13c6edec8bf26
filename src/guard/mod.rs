// src/guard/mod.rs
//! # Guard Module
//!
//! The request guard pipeline: an ordered list of stages, each taking
//! the request and a mutable guard context and answering either
//! "continue" or a terminal response. A small runner walks the list and
//! stops at the first terminal outcome; when every stage continues, the
//! validated session is attached to request extensions and the request
//! proceeds to its handler.
//!
//! Stage order is part of the contract: session validation first, then
//! the access decision over whatever the validation produced.

pub mod access;
pub mod classify;
pub mod session;

mod tests;

use axum::extract::{Extension, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::auth::models::AuthSession;
use crate::common::AppState;

pub use classify::RouteClass;

/// What a stage decided for this request.
pub enum StageOutcome {
    /// Hand over to the next stage (or to the route handler).
    Continue,
    /// Stop the pipeline and send this response.
    Terminal(Response),
}

/// Mutable context threaded through the stages of one request.
pub struct GuardContext {
    pub class: RouteClass,
    pub auth: AuthSession,
}

pub(crate) type StageFuture<'a> = Pin<Box<dyn Future<Output = StageOutcome> + Send + 'a>>;

/// A guard stage: reads the request parts, may update the context, and
/// yields continue-or-terminal.
pub(crate) type Stage =
    for<'a> fn(&'a AppState, &'a Parts, &'a mut GuardContext) -> StageFuture<'a>;

const STAGES: &[Stage] = &[session::validate, access::authorize];

/// Axum middleware entry point for the guard pipeline.
pub async fn pipeline(
    Extension(state): Extension<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut ctx = GuardContext {
        class: RouteClass::of(parts.uri.path()),
        auth: AuthSession::default(),
    };

    for stage in STAGES {
        if let StageOutcome::Terminal(response) = stage(&state, &parts, &mut ctx).await {
            return response;
        }
    }

    // Handlers read the validated session from extensions and never
    // re-derive it from headers.
    parts.extensions.insert(ctx.auth);
    next.run(Request::from_parts(parts, body)).await
}
