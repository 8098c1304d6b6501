//! User accounts and password hashing

use super::quota::Plan;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scribe_core::{sanitize_text, validation_error, ErrorContext, ScribeError, ScribeResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;
const MAX_EMAIL_CHARS: usize = 254;
const MAX_NAME_CHARS: usize = 100;

/// Stored account, including the password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            plan: self.plan,
            created_at: self.created_at,
        }
    }
}

/// Public user information
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub plan: Plan,
}

impl Registration {
    /// Normalize and validate raw registration fields
    pub fn new(email: &str, password: &str, name: Option<&str>, plan: Plan) -> ScribeResult<Self> {
        let email = normalize_email(email)?;

        let password_chars = password.chars().count();
        if password_chars < MIN_PASSWORD_CHARS {
            return Err(validation_error!(
                format!("Password must be at least {} characters", MIN_PASSWORD_CHARS),
                "password",
                "users"
            ));
        }
        if password_chars > MAX_PASSWORD_CHARS {
            return Err(validation_error!(
                format!("Password must be at most {} characters", MAX_PASSWORD_CHARS),
                "password",
                "users"
            ));
        }

        let name: String = name
            .map(sanitize_text)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string())
            .chars()
            .take(MAX_NAME_CHARS)
            .collect();

        Ok(Self {
            email,
            password: password.to_string(),
            name,
            plan,
        })
    }
}

/// Lowercase, trim and sanity-check an email address
pub fn normalize_email(email: &str) -> ScribeResult<String> {
    let email = email.trim().to_lowercase();
    let well_formed = email.len() <= MAX_EMAIL_CHARS
        && !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };

    if !well_formed {
        return Err(validation_error!(
            "A valid email address is required",
            "email",
            "users"
        ));
    }
    Ok(email)
}

/// Account storage
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account; a taken email is a `Conflict`
    async fn create(&self, registration: Registration) -> ScribeResult<UserRecord>;

    async fn find_by_email(&self, email: &str) -> ScribeResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: &str) -> ScribeResult<Option<UserRecord>>;
}

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<String, UserRecord>,
    id_by_email: HashMap<String, String>,
}

/// Process-local user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    accounts: RwLock<Accounts>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, registration: Registration) -> ScribeResult<UserRecord> {
        debug!(email = %registration.email, "Registering user");

        // Hash before taking the lock; argon2 is deliberately slow
        let password_hash = hash_password(&registration.password)?;
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: registration.email,
            name: registration.name,
            plan: registration.plan,
            password_hash,
            created_at: Utc::now(),
        };

        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if accounts.id_by_email.contains_key(&record.email) {
            return Err(ScribeError::Conflict {
                message: "An account with this email already exists".to_string(),
                context: ErrorContext::new("users").with_operation("create"),
            });
        }
        accounts
            .id_by_email
            .insert(record.email.clone(), record.id.clone());
        accounts.by_id.insert(record.id.clone(), record.clone());

        info!(user_id = %record.id, plan = %record.plan, "User registered");
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> ScribeResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        let accounts = self
            .accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(accounts
            .id_by_email
            .get(&email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> ScribeResult<Option<UserRecord>> {
        let accounts = self
            .accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(accounts.by_id.get(id).cloned())
    }
}

/// Hash password using Argon2
pub fn hash_password(password: &str) -> ScribeResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ScribeError::Internal {
            message: format!("Password hashing failed: {}", e),
            source: None,
            context: ErrorContext::new("users").with_operation("hash_password"),
        })
}

/// Verify password against hash; malformed hashes never verify
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Throwaway hash checked when a login names an unknown email, so that path
/// pays for one argon2 verification like a wrong password does
fn dummy_password_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("scribe-unknown-account").unwrap_or_default())
}

/// Verify against the dummy hash; the result carries no meaning
pub fn verify_dummy_password(password: &str) -> bool {
    verify_password(password, dummy_password_hash())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert_ne!(hash, "correct horse battery");
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = dummy_password_hash();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(std::ptr::eq(hash, dummy_password_hash()));
        assert!(!verify_dummy_password("password123"));
    }

    #[test]
    fn test_registration_validation() {
        let registration =
            Registration::new("  Ada@Example.COM ", "longenough", None, Plan::Free).unwrap();
        assert_eq!(registration.email, "ada@example.com");
        assert_eq!(registration.name, "ada");

        assert!(Registration::new("not-an-email", "longenough", None, Plan::Free).is_err());
        assert!(Registration::new("a@b", "longenough", None, Plan::Free).is_err());
        assert!(Registration::new("a@b.com", "short", None, Plan::Free).is_err());

        let named =
            Registration::new("a@b.com", "longenough", Some(" <Ada> "), Plan::Pro).unwrap();
        assert_eq!(named.name, "Ada");
        assert_eq!(named.plan, Plan::Pro);
    }

    #[tokio::test]
    async fn test_store_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        let registration =
            Registration::new("dup@example.com", "password123", None, Plan::Free).unwrap();

        let created = store.create(registration.clone()).await.unwrap();
        assert!(created.verify_password("password123"));

        let duplicate = Registration::new("DUP@example.com", "password456", None, Plan::Free).unwrap();
        assert!(matches!(
            store.create(duplicate).await,
            Err(ScribeError::Conflict { .. })
        ));
        assert_eq!(store.len(), 1);

        let found = store.find_by_email("Dup@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_id(&created.id).await.unwrap().is_some());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }
}
