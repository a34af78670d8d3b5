// JWT claim structures for access and refresh tokens.

use serde::{Deserialize, Serialize};

/// Claims carried by a short-lived access token. Verified entirely offline
/// against the signing key; no store lookup required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// User id (subject).
    pub sub: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(user_id: String, device_id: String, iat: i64, exp: i64) -> Self {
        Self {
            sub: user_id,
            device_id,
            token_type: "access".to_string(),
            iat,
            exp,
        }
    }

    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }
}

/// Claims carried by a long-lived refresh token. `jti` identifies the
/// corresponding store row so rotation can delete it by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(user_id: String, jti: String, device_id: String, iat: i64, exp: i64) -> Self {
        Self {
            sub: user_id,
            jti,
            device_id,
            token_type: "refresh".to_string(),
            iat,
            exp,
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == "refresh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_field_count_and_type_tag() {
        let claims = AccessClaims::new("user-1".into(), "device-1".into(), 0, 900);
        let value = serde_json::to_value(&claims).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert_eq!(obj.get("type").unwrap(), "access");
        assert!(claims.is_access());
    }

    #[test]
    fn test_refresh_claims_field_count_and_type_tag() {
        let claims = RefreshClaims::new("user-1".into(), "jti-1".into(), "device-1".into(), 0, 900);
        let value = serde_json::to_value(&claims).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(obj.get("type").unwrap(), "refresh");
        assert!(claims.is_refresh());
    }

    #[test]
    fn test_claims_round_trip_through_json() {
        let claims = AccessClaims::new("user-2".into(), "device-2".into(), 10, 1000);
        let json = serde_json::to_string(&claims).unwrap();
        let decoded: AccessClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims, decoded);
    }
}
