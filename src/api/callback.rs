use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::{types::CallbackResult, warning};

const SUCCESS_PAGE: &str = "<html><head><title>sporlsync</title></head><body>\
<h2>Authorization completed.</h2><p>This window closes itself, you can return to the terminal.</p>\
<script>setTimeout(window.close, 2000)</script>\
</body></html>";
const DENIED_PAGE: &str = "<html><head><title>sporlsync</title></head><body>\
<h2>Authorization was denied.</h2><p>Return to the terminal for details.</p>\
</body></html>";

/// Shared between the callback handler and the receiver that spawned it.
pub struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackResult>>>,
}

impl CallbackState {
    pub fn new(expected_state: &str, sender: oneshot::Sender<CallbackResult>) -> Self {
        Self {
            expected_state: expected_state.to_string(),
            sender: Mutex::new(Some(sender)),
        }
    }
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<CallbackState>>,
) -> (StatusCode, Html<&'static str>) {
    if params.get("state").map(String::as_str) != Some(shared_state.expected_state.as_str()) {
        warning!("Ignoring callback with unexpected state parameter.");
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Invalid state parameter.</h4>"),
        );
    }

    let result = match (params.get("code"), params.get("error")) {
        (Some(code), _) if !code.is_empty() => CallbackResult::Code(code.clone()),
        (_, Some(error)) => CallbackResult::Error(error.clone()),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Html("<h4>Missing authorization code.</h4>"),
            );
        }
    };

    let mut sender = shared_state.sender.lock().await;
    let Some(tx) = sender.take() else {
        return (
            StatusCode::GONE,
            Html("<h4>Authorization callback already received.</h4>"),
        );
    };

    let page = match result {
        CallbackResult::Code(_) => SUCCESS_PAGE,
        CallbackResult::Error(_) => DENIED_PAGE,
    };

    // The receiver may have timed out in the meantime.
    if tx.send(result).is_err() {
        return (
            StatusCode::GONE,
            Html("<h4>Authorization attempt expired.</h4>"),
        );
    }

    (StatusCode::OK, Html(page))
}
