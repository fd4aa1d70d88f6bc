use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;

use crate::board::presence::UserInfo;

const AUTHORIZE_USER_PATH: &str = "/v2/authorize-user";

/// Number of stock avatars served by the Sync Service.
pub const AVATAR_COUNT: u32 = 29;

/// Permissions granting read/write on storage, presence, and comments.
pub const FULL_ACCESS: &[&str] = &["room:write", "comments:write"];

/// Pick one of the stock avatars uniformly at random.
pub fn random_avatar() -> String {
    avatar_url(rand::rng().random_range(0..AVATAR_COUNT))
}

pub fn avatar_url(n: u32) -> String {
    format!("https://liveblocks.io/avatars/avatar-{}.png", n)
}

/// A request for a session grant scoped to one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub user_id: String,
    pub user_info: UserInfo,
    pub room_id: String,
}

/// The Sync Service's answer, passed through to the client untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeResponse {
    pub status: u16,
    pub body: String,
}

/// Mints session grants. Implemented by the Sync Service client.
#[async_trait]
pub trait SyncAuthorizer: Send + Sync {
    async fn authorize(&self, request: &SessionRequest) -> anyhow::Result<AuthorizeResponse>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeUserBody<'a> {
    user_id: &'a str,
    user_info: &'a UserInfo,
    permissions: BTreeMap<&'a str, &'static [&'static str]>,
}

/// Grant minting over the Sync Service's REST API.
pub struct LiveblocksAuthorizer {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl LiveblocksAuthorizer {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl SyncAuthorizer for LiveblocksAuthorizer {
    async fn authorize(&self, request: &SessionRequest) -> anyhow::Result<AuthorizeResponse> {
        let body = AuthorizeUserBody {
            user_id: &request.user_id,
            user_info: &request.user_info,
            permissions: BTreeMap::from([(request.room_id.as_str(), FULL_ACCESS)]),
        };
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, AUTHORIZE_USER_PATH))
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .context("Failed to send authorize request to sync service")?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .context("Failed to read authorize response from sync service")?;
        Ok(AuthorizeResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, http::HeaderMap, routing::post};

    use super::*;

    #[test]
    fn test_random_avatar_in_stock_range() {
        for _ in 0..100 {
            let url = random_avatar();
            let n: u32 = url
                .trim_start_matches("https://liveblocks.io/avatars/avatar-")
                .trim_end_matches(".png")
                .parse()
                .unwrap();
            assert!(n < AVATAR_COUNT);
        }
    }

    #[test]
    fn test_authorize_body_shape() {
        let info = UserInfo {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: avatar_url(3),
        };
        let body = AuthorizeUserBody {
            user_id: "ada@example.com",
            user_info: &info,
            permissions: BTreeMap::from([("R1", FULL_ACCESS)]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["userId"], "ada@example.com");
        assert_eq!(json["userInfo"]["avatar"], avatar_url(3));
        assert_eq!(
            json["permissions"]["R1"],
            serde_json::json!(["room:write", "comments:write"])
        );
        assert_eq!(json["permissions"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_liveblocks_authorizer_posts_scoped_request() {
        let seen: Arc<Mutex<Option<(String, serde_json::Value)>>> = Arc::new(Mutex::new(None));
        let seen_in_handler = Arc::clone(&seen);
        let app = Router::new().route(
            AUTHORIZE_USER_PATH,
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let seen = Arc::clone(&seen_in_handler);
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *seen.lock().unwrap() = Some((auth, body));
                    Json(serde_json::json!({"token": "grant-123"}))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let authorizer = LiveblocksAuthorizer::new(format!("http://{}", addr), "sk_test");
        let resp = authorizer
            .authorize(&SessionRequest {
                user_id: "ada@example.com".into(),
                user_info: UserInfo {
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                    avatar: avatar_url(0),
                },
                room_id: "R1".into(),
            })
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("grant-123"));
        let (auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer sk_test");
        assert_eq!(body["userInfo"]["name"], "Ada");
        assert!(body["permissions"]["R1"].is_array());
    }

    #[tokio::test]
    async fn test_liveblocks_authorizer_unreachable_is_error() {
        let authorizer = LiveblocksAuthorizer::new("http://127.0.0.1:1", "sk_test");
        let result = authorizer
            .authorize(&SessionRequest {
                user_id: "x".into(),
                user_info: UserInfo {
                    name: "x".into(),
                    email: "x".into(),
                    avatar: avatar_url(0),
                },
                room_id: "R1".into(),
            })
            .await;
        assert!(result.is_err());
    }
}
