//! User directory
//!
//! Accounts persisted as JSON, salted password hashes and HS256 session tokens.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::model::{Credentials, Identity, Registration, Session};
use crate::{Error, Result};

pub const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    email: String,
    exp: usize,
    /// Unique per issue, so two sessions never share a token
    jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: Uuid,
    email: String,
    display_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.id.to_string(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }
}

/// Shared account store used by every identity provider instance
pub struct UserDirectory {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    file_path: PathBuf,
    settings: DirectorySettings,
}

impl UserDirectory {
    /// Open the directory stored under `base_dir`
    pub async fn open(base_dir: PathBuf, settings: DirectorySettings) -> Result<Self> {
        tokio::fs::create_dir_all(&base_dir).await?;
        let file_path = base_dir.join("users.json");
        let users = load_users(&file_path).await?;

        Ok(Self {
            users: RwLock::new(users),
            file_path,
            settings,
        })
    }

    pub async fn register(&self, registration: &Registration) -> Result<Identity> {
        let email = normalize_email(&registration.email)?;
        validate_password(&registration.password)?;

        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(Error::Conflict(format!("User '{}' already exists", email)));
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            email,
            display_name: sanitize_optional_string(registration.display_name.clone()),
            password_hash: hash_password(&registration.password),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        persist_users(&self.file_path, &users).await?;
        info!(uid = %user.id, "user registered");
        Ok(user.identity())
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity> {
        let email = normalize_email(&credentials.email)?;
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|user| user.email == email)
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))?;
        if !verify_password(&user.password_hash, &credentials.password) {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(user.identity())
    }

    pub async fn get(&self, uid: &str) -> Option<Identity> {
        let id = Uuid::parse_str(uid).ok()?;
        self.users.read().await.get(&id).map(UserRecord::identity)
    }

    /// Issue a signed session token for `identity`
    pub fn issue_session(&self, identity: Identity) -> Result<Session> {
        let expires_at = Utc::now() + Duration::seconds(self.settings.token_ttl_seconds);
        let exp = usize::try_from(expires_at.timestamp())
            .map_err(|_| Error::Storage("Failed to encode token expiration".to_string()))?;
        let claims = SessionClaims {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
        )
        .map_err(|err| Error::Storage(format!("Failed to encode JWT: {}", err)))?;

        Ok(Session {
            token,
            expires_at,
            identity,
        })
    }

    /// Check a token and rebuild the session it belongs to
    pub async fn verify_session(&self, token: &str) -> Result<Session> {
        let decoded = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| Error::Unauthorized(format!("Invalid token: {}", err)))?;
        let claims = decoded.claims;

        let identity = self
            .get(&claims.sub)
            .await
            .ok_or_else(|| Error::Unauthorized("User not found".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or_else(|| Error::Unauthorized("Invalid token expiration".to_string()))?;

        Ok(Session {
            token: token.to_string(),
            expires_at,
            identity,
        })
    }
}

async fn load_users(path: &Path) -> Result<HashMap<Uuid, UserRecord>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let users: Vec<UserRecord> = serde_json::from_str(&content)?;
    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

async fn persist_users(path: &Path, users: &HashMap<Uuid, UserRecord>) -> Result<()> {
    let mut records: Vec<&UserRecord> = users.values().collect();
    records.sort_by(|left, right| left.created_at.cmp(&right.created_at));
    let content = serde_json::to_string_pretty(&records)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

fn sanitize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn normalize_email(email: &str) -> Result<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return Err(Error::InvalidInput("Invalid email".to_string()));
    }
    Ok(normalized)
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(Error::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!(
        "v1${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let (Some("v1"), Some(encoded_salt), Some(encoded_digest)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Ok(salt) = URL_SAFE_NO_PAD.decode(encoded_salt) else {
        return false;
    };
    let Ok(expected_digest) = URL_SAFE_NO_PAD.decode(encoded_digest) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    expected_digest == hasher.finalize().as_slice()
}
