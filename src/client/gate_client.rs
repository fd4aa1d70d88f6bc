use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::errors::ClientError;
use crate::gate::api::AUTH_ROUTE;
use crate::gate::validate::JoinRequest;

pub const DEFAULT_GATE_URL: &str = "http://127.0.0.1:3141";

const ROOM_PREFIX: &str = "/room/";

/// A room location: `/room/{slug}`, a full URL to it, or the bare slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRoute {
    pub room_id: String,
}

impl RoomRoute {
    pub fn parse(input: &str) -> Result<Self, ClientError> {
        let input = input.trim();
        let path = if input.contains("://") {
            let url = Url::parse(input).map_err(|_| ClientError::InvalidRoom(input.to_string()))?;
            url.path().to_string()
        } else {
            input.to_string()
        };

        let slug = match path.strip_prefix(ROOM_PREFIX) {
            Some(rest) => rest,
            None if path.starts_with('/') => return Err(ClientError::InvalidRoom(input.to_string())),
            None => path.as_str(),
        };
        let slug = slug.trim_end_matches('/');
        if slug.is_empty() || slug.contains('/') {
            return Err(ClientError::InvalidRoom(input.to_string()));
        }
        Ok(Self {
            room_id: slug.to_string(),
        })
    }

    pub fn path(&self) -> String {
        format!("{}{}", ROOM_PREFIX, self.room_id)
    }
}

#[derive(Debug, Deserialize)]
struct FailureBody {
    message: Option<String>,
}

/// HTTP client for the session gate.
pub struct GateClient {
    client: reqwest::Client,
    base_url: String,
}

impl GateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Ask the gate for a session grant. The grant body is returned as-is.
    pub async fn request_grant(&self, join: &JoinRequest) -> Result<serde_json::Value, ClientError> {
        if [&join.name, &join.email, &join.room_key]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(ClientError::Validation("All fields are required".into()));
        }

        let url = format!("{}{}", self.base_url, AUTH_ROUTE);
        tracing::debug!(%url, room_id = %join.room_id, "requesting session grant");
        let resp = self
            .client
            .post(&url)
            .json(join)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return resp.json().await.map_err(ClientError::Transport);
        }

        let message = resp
            .json::<FailureBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "Authentication failed".to_string());
        tracing::warn!(status = status.as_u16(), %message, "gate refused join");
        Err(match status {
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::FORBIDDEN => ClientError::Authorization(message),
            other => ClientError::Rejected {
                status: other.as_u16(),
                message,
            },
        })
    }
}
