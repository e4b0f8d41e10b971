//! Admin bootstrap.
//!
//! Creates (or finds) the operator's account at the identity provider and marks it with
//! the `admin` claim. Runs from the `provision-admin` binary only; nothing here is
//! mounted on the HTTP surface.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use thiserror::Error;

/// ProvisionError
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("identity provider rejected the request: {0}")]
    Provider(String),

    #[error("identity provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// IdentityUser
///
/// The slice of a provider account the provisioner cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
    pub admin: bool,
}

/// ProvisionOutcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub uid: String,
    pub email: String,
    /// False when the account already existed.
    pub created: bool,
}

/// IdentityAdmin Contract
///
/// Privileged account management at the identity provider.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<IdentityUser>, ProvisionError>;

    async fn create_user(&self, email: &str, password: &str)
    -> Result<IdentityUser, ProvisionError>;

    async fn set_admin_claim(&self, uid: &str) -> Result<(), ProvisionError>;
}

/// provision_admin
///
/// Idempotent: a second run for the same email finds the existing account, creates
/// nothing and re-applies the claim.
pub async fn provision_admin(
    admin: &dyn IdentityAdmin,
    email: &str,
    password: &str,
) -> Result<ProvisionOutcome, ProvisionError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ProvisionError::MissingCredentials);
    }

    let (user, created) = match admin.find_user_by_email(email).await? {
        Some(existing) => {
            tracing::info!(uid = %existing.uid, "admin account already exists");
            (existing, false)
        }
        None => {
            let user = admin.create_user(email, password).await?;
            tracing::info!(uid = %user.uid, "admin account created");
            (user, true)
        }
    };

    admin.set_admin_claim(&user.uid).await?;
    tracing::info!(uid = %user.uid, "admin claim set");

    Ok(ProvisionOutcome {
        uid: user.uid,
        email: user.email,
        created,
    })
}

// --- Supabase Admin API ---

#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: serde_json::Value,
}

impl From<SupabaseUser> for IdentityUser {
    fn from(user: SupabaseUser) -> Self {
        IdentityUser {
            uid: user.id,
            email: user.email.unwrap_or_default(),
            admin: user.app_metadata.get("admin").and_then(|v| v.as_bool()) == Some(true),
        }
    }
}

#[derive(Deserialize)]
struct SupabaseUserPage {
    #[serde(default)]
    users: Vec<SupabaseUser>,
}

const PAGE_SIZE: usize = 200;

/// SupabaseIdentityAdmin
///
/// Talks to the provider's GoTrue admin endpoints (`/auth/v1/admin/users`) with the
/// service-role key. The `admin` flag is written to `app_metadata`, which the provider
/// copies into issued tokens.
pub struct SupabaseIdentityAdmin {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseIdentityAdmin {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/auth/v1/admin/users{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ProvisionError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ProvisionError::Provider(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl IdentityAdmin for SupabaseIdentityAdmin {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, ProvisionError> {
        // The admin API has no lookup by email, so page through the user list.
        let mut page = 1;
        loop {
            let response = self
                .request(reqwest::Method::GET, "")
                .query(&[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())])
                .send()
                .await?;
            let batch = Self::checked(response).await?.json::<SupabaseUserPage>().await?;
            let batch_len = batch.users.len();

            let found = batch.users.into_iter().find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            });
            if let Some(user) = found {
                return Ok(Some(user.into()));
            }
            if batch_len < PAGE_SIZE {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, ProvisionError> {
        let response = self
            .request(reqwest::Method::POST, "")
            .json(&json!({ "email": email, "password": password, "email_confirm": true }))
            .send()
            .await?;
        let user = Self::checked(response).await?.json::<SupabaseUser>().await?;
        Ok(user.into())
    }

    async fn set_admin_claim(&self, uid: &str) -> Result<(), ProvisionError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/{}", uid))
            .json(&json!({ "app_metadata": { "admin": true } }))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }
}

// --- In-Memory Fake ---

/// InMemoryIdentityAdmin
///
/// Account registry kept in a vector. Counts creations so tests can check idempotency.
#[derive(Default)]
pub struct InMemoryIdentityAdmin {
    users: Mutex<Vec<IdentityUser>>,
    /// When true, every call fails as if the provider were down.
    pub should_fail: bool,
}

impl InMemoryIdentityAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn users(&self) -> Vec<IdentityUser> {
        self.users.lock().map(|u| u.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), ProvisionError> {
        if self.should_fail {
            return Err(ProvisionError::Provider("simulated outage".to_string()));
        }
        Ok(())
    }

    fn with_users<T>(
        &self,
        f: impl FnOnce(&mut Vec<IdentityUser>) -> T,
    ) -> Result<T, ProvisionError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| ProvisionError::Provider("identity registry poisoned".to_string()))?;
        Ok(f(&mut users))
    }
}

#[async_trait]
impl IdentityAdmin for InMemoryIdentityAdmin {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, ProvisionError> {
        self.check()?;
        self.with_users(|users| {
            users
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned()
        })
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<IdentityUser, ProvisionError> {
        self.check()?;
        self.with_users(|users| {
            let user = IdentityUser {
                uid: uuid::Uuid::new_v4().to_string(),
                email: email.to_string(),
                admin: false,
            };
            users.push(user.clone());
            user
        })
    }

    async fn set_admin_claim(&self, uid: &str) -> Result<(), ProvisionError> {
        self.check()?;
        self.with_users(|users| users.iter_mut().find(|u| u.uid == uid).map(|u| u.admin = true))?
            .ok_or_else(|| ProvisionError::Provider(format!("no user with uid {}", uid)))
    }
}
