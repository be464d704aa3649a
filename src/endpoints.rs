//! API endpoint URL construction

use crate::util::encode_path;

/// API v1 base path
pub const API_V1_BASE: &str = "/v1";

/// Endpoint builder
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Create a new endpoints builder
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the full URL for a path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current data of a secret
    pub fn secret_data(&self, project_id: &str, secret_name: &str) -> String {
        self.url(&format!(
            "{}/projects/{}/secrets/{}/data",
            API_V1_BASE,
            encode_path(project_id),
            encode_path(secret_name)
        ))
    }
}
