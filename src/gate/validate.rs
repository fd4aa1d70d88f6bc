use serde::{Deserialize, Serialize};

use crate::board::presence::UserInfo;
use crate::config::RoomSecrets;
use crate::errors::GateError;

use super::grant::SessionRequest;

/// Body of a room-join request. Missing fields deserialize as empty so they
/// fail validation instead of JSON parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub room_key: String,
}

impl JoinRequest {
    /// Check required fields, then the room key. The avatar is chosen by the
    /// caller so the outcome here is deterministic.
    pub fn authorize(&self, secrets: &RoomSecrets, avatar: String) -> Result<SessionRequest, GateError> {
        if [&self.name, &self.email, &self.room_key]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(GateError::Validation);
        }
        if !secrets.verify(&self.room_id, &self.room_key) {
            return Err(GateError::Authorization {
                room_id: self.room_id.clone(),
            });
        }
        Ok(SessionRequest {
            user_id: self.email.clone(),
            user_info: UserInfo {
                name: self.name.clone(),
                email: self.email.clone(),
                avatar,
            },
            room_id: self.room_id.clone(),
        })
    }
}
