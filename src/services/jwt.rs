// RS256 access/refresh token issuance and verification.
//
// The signing key is loaded from a configured file path at startup. If the
// file does not exist, a fresh RSA-2048 key pair is generated and written
// with mode 0600 permissions; the public half is reconstructed from the
// private key in memory, never persisted separately.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::RsaPrivateKey;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use thiserror::Error;

use crate::models::auth::{AccessClaims, RefreshClaims};
use crate::services::ids;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("failed to generate signing key: {0}")]
    KeyGeneration(String),

    #[error("failed to read or write signing key file: {0}")]
    KeyIo(String),

    #[error("invalid signing key format: {0}")]
    InvalidKeyFormat(String),

    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("unexpected token type")]
    WrongTokenType,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid,
        }
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_secs: i64,
    refresh_token_expiry_secs: i64,
}

impl JwtService {
    /// Load the RS256 key pair from `key_path`, generating and persisting
    /// a new one if the file is absent.
    pub fn from_key_file(
        key_path: &str,
        access_token_expiry_secs: u64,
        refresh_token_expiry_secs: u64,
    ) -> Result<Self, JwtError> {
        let pem = if Path::new(key_path).exists() {
            fs::read_to_string(key_path).map_err(|e| JwtError::KeyIo(e.to_string()))?
        } else {
            let mut rng = rand::thread_rng();
            let private_key = RsaPrivateKey::new(&mut rng, 2048)
                .map_err(|e| JwtError::KeyGeneration(e.to_string()))?;
            let pem = private_key
                .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
                .map_err(|e| JwtError::KeyGeneration(e.to_string()))?
                .to_string();

            fs::write(key_path, &pem).map_err(|e| JwtError::KeyIo(e.to_string()))?;
            #[cfg(unix)]
            fs::set_permissions(key_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| JwtError::KeyIo(e.to_string()))?;

            pem
        };

        let private_key = RsaPrivateKey::from_pkcs1_pem(&pem)
            .map_err(|e| JwtError::InvalidKeyFormat(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| JwtError::InvalidKeyFormat(e.to_string()))?;

        let public_key_pem = {
            use rsa::pkcs1::EncodeRsaPublicKey;
            let public_key = private_key.to_public_key();
            public_key
                .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
                .map_err(|e| JwtError::KeyGeneration(e.to_string()))?
        };
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKeyFormat(e.to_string()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            access_token_expiry_secs: access_token_expiry_secs as i64,
            refresh_token_expiry_secs: refresh_token_expiry_secs as i64,
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation
    }

    pub fn sign_access_token(&self, user_id: &str, device_id: &str) -> Result<String, JwtError> {
        let now_secs = ids::now_millis() / 1000;
        let claims = AccessClaims::new(
            user_id.to_string(),
            device_id.to_string(),
            now_secs,
            now_secs + self.access_token_expiry_secs,
        );
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Returns the signed token and the claims used to mint it (so the
    /// caller can register the corresponding store row under the same
    /// `jti`).
    pub fn sign_refresh_token(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> Result<(String, RefreshClaims), JwtError> {
        let now_secs = ids::now_millis() / 1000;
        let claims = RefreshClaims::new(
            user_id.to_string(),
            ids::new_id(),
            device_id.to_string(),
            now_secs,
            now_secs + self.refresh_token_expiry_secs,
        );
        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok((token, claims))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &Self::validation())?;
        if !data.claims.is_access() {
            return Err(JwtError::WrongTokenType);
        }
        Ok(data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let data = decode::<RefreshClaims>(token, &self.decoding_key, &Self::validation())?;
        if !data.claims.is_refresh() {
            return Err(JwtError::WrongTokenType);
        }
        Ok(data.claims)
    }

    pub fn refresh_token_expiry_ms(&self) -> i64 {
        ids::now_millis() + self.refresh_token_expiry_secs * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> (JwtService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("test.key");
        let service = JwtService::from_key_file(key_path.to_str().unwrap(), 900, 2_592_000).unwrap();
        (service, dir)
    }

    #[test]
    fn test_key_file_generated_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("reused.key");
        assert!(!key_path.exists());

        let first = JwtService::from_key_file(key_path.to_str().unwrap(), 900, 2_592_000).unwrap();
        assert!(key_path.exists());

        let second = JwtService::from_key_file(key_path.to_str().unwrap(), 900, 2_592_000).unwrap();

        let token = first.sign_access_token("u1", "d1").unwrap();
        assert!(second.verify_access_token(&token).is_ok());
    }

    #[test]
    fn test_access_token_round_trip() {
        let (service, _dir) = test_service();
        let token = service.sign_access_token("user-1", "device-1").unwrap();
        let claims = service.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.device_id, "device-1");
    }

    #[test]
    fn test_refresh_token_wrong_type_rejected_as_access() {
        let (service, _dir) = test_service();
        let (refresh_token, _claims) = service.sign_refresh_token("user-1", "device-1").unwrap();
        let result = service.verify_access_token(&refresh_token);
        assert!(matches!(result, Err(JwtError::WrongTokenType)));
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let (service, _dir) = test_service();
        let now_secs = ids::now_millis() / 1000;
        let claims = AccessClaims::new("user-1".into(), "device-1".into(), now_secs - 1000, now_secs - 1);
        let token = encode(&Header::new(Algorithm::RS256), &claims, &service.encoding_key).unwrap();
        let result = service.verify_access_token(&token);
        assert!(matches!(result, Err(JwtError::Expired)));
    }
}
