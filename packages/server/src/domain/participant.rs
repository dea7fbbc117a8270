//! Room participant entity.

use serde::{Deserialize, Serialize};

use super::ClientId;

/// A connection that has joined a room.
///
/// The avatar is an opaque client-chosen value; the server only enforces
/// that it is unique within the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ClientId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<serde_json::Value>,
}

impl Participant {
    pub fn new(id: ClientId, name: String, avatar: Option<serde_json::Value>) -> Self {
        // a JSON null avatar means "no avatar picked"
        let avatar = avatar.filter(|v| !v.is_null());
        Self { id, name, avatar }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_avatar_is_treated_as_absent() {
        // given / when:
        let p = Participant::new(
            ClientId::random(),
            "Ana".to_string(),
            Some(serde_json::Value::Null),
        );

        // then:
        assert_eq!(p.avatar, None);
    }

    #[test]
    fn test_avatar_value_is_kept_verbatim() {
        // given / when:
        let p = Participant::new(
            ClientId::random(),
            "Ana".to_string(),
            Some(serde_json::json!("lion")),
        );

        // then:
        assert_eq!(p.avatar, Some(serde_json::json!("lion")));
    }
}
