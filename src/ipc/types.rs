use crate::client::GradebookSource;
use crate::view::ViewRegistry;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub backend: Option<Box<dyn GradebookSource>>,
    pub backend_url: Option<String>,
    pub timeout: Duration,
    pub views: ViewRegistry,
}

impl AppState {
    pub fn new(timeout: Duration) -> Self {
        Self {
            backend: None,
            backend_url: None,
            timeout,
            views: ViewRegistry::default(),
        }
    }
}
