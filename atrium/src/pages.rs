//! Minimal page surface proving the downstream contract.
//!
//! Real rendering lives outside the core; these handlers only show how a
//! page reads the session fields the enrichment layer guarantees.

use axum::{Extension, Router, response::Html, routing::get};
use context::SessionContext;

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

async fn home(Extension(session): Extension<SessionContext>) -> Html<String> {
    let body = if session.is_authenticated {
        format!("<h1>Welcome back, {}</h1>", session.user_name)
    } else {
        "<h1>Welcome</h1><p>You are not signed in.</p>".to_string()
    };

    Html(body)
}
