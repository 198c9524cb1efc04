use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod assessment;
pub(crate) mod auth;
pub(crate) mod iep;
pub(crate) mod intervention;
pub(crate) mod student;
pub(crate) mod user;

/// Envelope for every successful API response.
#[derive(Debug, Serialize)]
pub(crate) struct ApiSuccess<T> {
    pub(crate) success: bool,
    pub(crate) data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl<T> ApiSuccess<T> {
    pub(crate) fn new(data: T) -> Self {
        Self { success: true, data, message: None }
    }

    pub(crate) fn with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data, message: Some(message.into()) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}
