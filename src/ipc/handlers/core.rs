use crate::client::HttpGradebookSource;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::time::Duration;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backendUrl": state.backend_url,
            "openViews": state.views.len(),
        }),
    )
}

fn handle_backend_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(base_url) = req.params.get("baseUrl").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.baseUrl", None);
    };

    let timeout = match req.params.get("timeoutSecs") {
        None => state.timeout,
        Some(v) if v.is_null() => state.timeout,
        Some(v) => match v.as_u64() {
            Some(n) if n > 0 => Duration::from_secs(n),
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    "timeoutSecs must be a positive integer",
                    None,
                )
            }
        },
    };

    match HttpGradebookSource::new(base_url, timeout) {
        Ok(source) => {
            let url = source.base_url().to_string();
            tracing::info!(backend = %url, timeout_secs = timeout.as_secs(), "backend selected");
            state.backend = Some(Box::new(source));
            state.backend_url = Some(url.clone());
            state.timeout = timeout;
            ok(&req.id, json!({ "backendUrl": url }))
        }
        Err(e) => err(
            &req.id,
            "bad_params",
            format!("{e:#}"),
            Some(json!({ "baseUrl": base_url })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "backend.select" => Some(handle_backend_select(state, req)),
        _ => None,
    }
}
