//! # In-Memory Backend
//!
//! A [`RemoteService`] over fixture data, used by the CLI and the tests.
//!
//! Fixtures are TOML documents with one array of tables per collection:
//!
//! ```toml
//! [[users]]
//! id = "u7"
//! email = "ada@example.com"
//! password = "hunter22"
//!
//! [[profiles]]
//! id = "u7"
//! display_name = "Ada"
//! profile_visibility = "anyone"
//!
//! [[friendships]]
//! user_id = "u7"
//! friend_id = "u8"
//! status = "accepted"
//! ```
//!
//! Queries and remote functions share one operation table.

use super::{BackendError, CallFailure, RawReply, RemoteService, Reply, ops};
use crate::error::ConfigError;
use async_trait::async_trait;
use chrono::Utc;
use huddle_core::{
    ProductRecord, ProfilePatch, ProfileRecord, SubscriptionRecord, TransactionRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Shortest password sign-up accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Lifetime of an issued session.
const SESSION_TTL_SECS: i64 = 3600;

const INVALID_PARAMS: &str = "INVALID_PARAMS";
const UNKNOWN_OPERATION: &str = "UNKNOWN_OPERATION";

// =============================================================================
// FIXTURE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureUser {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureFriendship {
    pub user_id: String,
    pub friend_id: String,
    pub status: String,
}

/// Seed data of a [`MemoryService`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Sign-up returns a user without a session, as if email confirmation were pending.
    pub require_email_confirmation: bool,
    pub users: Vec<FixtureUser>,
    pub profiles: Vec<ProfileRecord>,
    pub friendships: Vec<FixtureFriendship>,
    pub subscriptions: Vec<SubscriptionRecord>,
    pub products: Vec<ProductRecord>,
    pub transactions: Vec<TransactionRecord>,
}

impl Fixture {
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source, path)
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// One call as the backend received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
enum Fault {
    Transport(String),
    Refusal(BackendError),
}

#[derive(Debug, Default)]
struct Tables {
    fixture: Fixture,
    /// access token → session payload
    sessions: BTreeMap<String, Value>,
    current: Option<String>,
    issued: u64,
}

/// Fixture-backed [`RemoteService`].
#[derive(Debug, Default)]
pub struct MemoryService {
    tables: RwLock<Tables>,
    faults: RwLock<BTreeMap<String, Fault>>,
    calls: RwLock<Vec<RecordedCall>>,
}

impl MemoryService {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            tables: RwLock::new(Tables {
                fixture,
                ..Tables::default()
            }),
            ..Self::default()
        }
    }

    /// Make every later call to `operation` fail before reaching the tables.
    pub async fn fail_transport(&self, operation: &str, message: impl Into<String>) {
        self.faults
            .write()
            .await
            .insert(operation.to_string(), Fault::Transport(message.into()));
    }

    /// Make every later call to `operation` come back refused with `error`.
    pub async fn refuse(&self, operation: &str, error: BackendError) {
        self.faults
            .write()
            .await
            .insert(operation.to_string(), Fault::Refusal(error));
    }

    /// Remove an injected fault.
    pub async fn heal(&self, operation: &str) {
        self.faults.write().await.remove(operation);
    }

    /// Calls received so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Names of the calls received so far, oldest first.
    pub async fn operations(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|c| c.operation.clone())
            .collect()
    }

    async fn handle(&self, name: &str, params: Value) -> Result<RawReply, CallFailure> {
        self.calls.write().await.push(RecordedCall {
            operation: name.to_string(),
            params: params.clone(),
        });

        if let Some(fault) = self.faults.read().await.get(name).cloned() {
            return match fault {
                Fault::Transport(message) => Err(CallFailure::Transport(message)),
                Fault::Refusal(error) => Ok(RawReply::refused(error)),
            };
        }

        let mut tables = self.tables.write().await;
        let reply = match name {
            ops::AUTH_SIGN_UP => tables.sign_up(&params),
            ops::AUTH_SIGN_IN => tables.sign_in(&params),
            ops::AUTH_SIGN_OUT => tables.sign_out(&params),
            ops::AUTH_SESSION => Ok(tables.current_session()),
            ops::PROFILES_GET => tables.profile(&params),
            ops::PROFILES_UPDATE => tables.update_profile(&params),
            ops::FRIENDSHIPS_STATUS => tables.friendship(&params),
            ops::SUBSCRIPTIONS_CURRENT => tables.subscription(&params),
            ops::PRODUCTS_LIST => to_json(&tables.fixture.products),
            ops::TRANSACTIONS_LIST => tables.transactions(&params),
            other => Err(BackendError::new(
                UNKNOWN_OPERATION,
                format!("no operation named `{other}`"),
            )
            .with_status_code(404)),
        };

        Ok(match reply {
            Ok(data) => RawReply::ok(data),
            Err(error) => RawReply::refused(error),
        })
    }
}

#[async_trait]
impl RemoteService for MemoryService {
    async fn perform_query(&self, name: &str, params: Value) -> Result<RawReply, CallFailure> {
        self.handle(name, params).await
    }

    async fn perform_remote_call(&self, name: &str, body: Value) -> Result<RawReply, CallFailure> {
        self.handle(name, body).await
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Tables {
    fn sign_up(&mut self, params: &Value) -> Reply<Value> {
        let email = param(params, "email")?.trim().to_ascii_lowercase();
        let password = param(params, "password")?;

        if !is_valid_email(&email) {
            return Err(
                BackendError::new("AUTH_INVALID_EMAIL", "email address is invalid")
                    .with_status_code(400),
            );
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::new(
                "AUTH_WEAK_PASSWORD",
                format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            )
            .with_status_code(422));
        }
        if self.fixture.users.iter().any(|u| u.email == email) {
            return Err(
                BackendError::new("AUTH_USER_EXISTS", "user already registered")
                    .with_status_code(422),
            );
        }

        let now = Utc::now().to_rfc3339();
        let user = FixtureUser {
            id: self.next_user_id(),
            email: email.clone(),
            password: password.to_string(),
            created_at: Some(now.clone()),
        };
        let display_name = email.split('@').next().unwrap_or_default().to_string();
        self.fixture.profiles.push(ProfileRecord {
            id: Some(user.id.clone()),
            display_name: Some(display_name),
            membership_tier: Some("bronze".to_string()),
            points_balance: Some(0),
            lifetime_points: Some(0),
            created_at: Some(now),
            profile_visibility: Some("friends".to_string()),
            ..ProfileRecord::default()
        });
        self.fixture.users.push(user.clone());

        if self.fixture.require_email_confirmation {
            return Ok(json!({ "user": user_json(&user), "session": null }));
        }
        let session = self.issue_session(&user);
        Ok(json!({ "user": user_json(&user), "session": session }))
    }

    fn sign_in(&mut self, params: &Value) -> Reply<Value> {
        let email = param(params, "email")?.trim().to_ascii_lowercase();
        let password = param(params, "password")?;

        let user = self
            .fixture
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .cloned()
            .ok_or_else(|| {
                BackendError::new("AUTH_INVALID_CREDENTIALS", "invalid login credentials")
                    .with_status_code(400)
            })?;

        let session = self.issue_session(&user);
        Ok(json!({ "user": user_json(&user), "session": session }))
    }

    fn sign_out(&mut self, params: &Value) -> Reply<Value> {
        let token = params
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.current.clone());

        if let Some(token) = token {
            self.sessions.remove(&token);
            if self.current.as_deref() == Some(token.as_str()) {
                self.current = None;
            }
        }
        Ok(Value::Null)
    }

    fn current_session(&self) -> Value {
        self.current
            .as_ref()
            .and_then(|token| self.sessions.get(token))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn profile(&self, params: &Value) -> Reply<Value> {
        let id = param(params, "id")?;
        match self.find_profile(id) {
            Some(record) => to_json(record),
            None => Ok(Value::Null),
        }
    }

    fn update_profile(&mut self, params: &Value) -> Reply<Value> {
        let id = param(params, "id")?.to_string();
        let patch: ProfilePatch = params
            .get("patch")
            .cloned()
            .ok_or_else(|| missing_param("patch"))
            .and_then(|raw| {
                serde_json::from_value(raw).map_err(|e| {
                    BackendError::new(INVALID_PARAMS, format!("invalid patch: {e}"))
                        .with_status_code(400)
                })
            })?;

        let record = self
            .fixture
            .profiles
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| {
                BackendError::new(huddle_core::codes::NOT_FOUND, format!("profile {id} not found"))
                    .with_status_code(404)
            })?;

        match patch {
            ProfilePatch::DisplayName(v) => record.display_name = Some(v),
            ProfilePatch::AvatarUrl(v) => record.avatar_url = v,
            ProfilePatch::Neighborhood(v) => record.neighborhood = v,
            ProfilePatch::City(v) => record.city = v,
            ProfilePatch::Bio(v) => record.bio = v,
            ProfilePatch::SocialHandle(v) => record.social_handle = v,
            ProfilePatch::Visibility(v) => record.profile_visibility = Some(v.as_str().to_string()),
        }
        to_json(&*record)
    }

    fn friendship(&self, params: &Value) -> Reply<Value> {
        let user_id = param(params, "user_id")?;
        let friend_id = param(params, "friend_id")?;

        let found = self.fixture.friendships.iter().find(|f| {
            (f.user_id == user_id && f.friend_id == friend_id)
                || (f.user_id == friend_id && f.friend_id == user_id)
        });
        Ok(found.map_or(Value::Null, |f| json!({ "status": f.status })))
    }

    fn subscription(&self, params: &Value) -> Reply<Value> {
        let user_id = param(params, "user_id")?;
        match self
            .fixture
            .subscriptions
            .iter()
            .rev()
            .find(|s| s.user_id.as_deref() == Some(user_id))
        {
            Some(record) => to_json(record),
            None => Ok(Value::Null),
        }
    }

    fn transactions(&self, params: &Value) -> Reply<Value> {
        let user_id = param(params, "user_id")?;
        let rows: Vec<&TransactionRecord> = self
            .fixture
            .transactions
            .iter()
            .filter(|t| t.user_id.as_deref() == Some(user_id))
            .collect();
        to_json(&rows)
    }

    fn find_profile(&self, id: &str) -> Option<&ProfileRecord> {
        self.fixture
            .profiles
            .iter()
            .find(|p| p.id.as_deref() == Some(id))
    }

    /// `u<n+1>`, where `n` is the highest numeric `u<n>` id in the tables.
    fn next_user_id(&self) -> String {
        let highest = self
            .fixture
            .users
            .iter()
            .map(|u| u.id.as_str())
            .chain(self.fixture.profiles.iter().filter_map(|p| p.id.as_deref()))
            .filter_map(|id| id.strip_prefix('u')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("u{}", highest.saturating_add(1))
    }

    fn issue_session(&mut self, user: &FixtureUser) -> Value {
        self.issued += 1;
        let token = format!("mem-{}-{}", user.id, self.issued);
        let session = json!({
            "access_token": token,
            "refresh_token": format!("refresh-{}", self.issued),
            "expires_at": Utc::now().timestamp() + SESSION_TTL_SECS,
            "user": user_json(user),
        });
        self.sessions.insert(token.clone(), session.clone());
        self.current = Some(token);
        session
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn user_json(user: &FixtureUser) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "created_at": user.created_at,
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Reply<Value> {
    serde_json::to_value(value).map_err(|e| BackendError::new("INTERNAL", e.to_string()))
}

fn missing_param(key: &str) -> BackendError {
    BackendError::new(INVALID_PARAMS, format!("missing parameter `{key}`")).with_status_code(400)
}

fn param<'a>(params: &'a Value, key: &str) -> Result<&'a str, BackendError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| missing_param(key))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// =============================================================================
// TESTS
// =============================================================================
