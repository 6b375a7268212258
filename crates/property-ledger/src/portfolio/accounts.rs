use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::documents::DocumentStore;
use super::domain::{Owner, OwnerId};
use super::repository::PortfolioStore;
use super::service::{PortfolioError, PortfolioPolicy, PortfolioService};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Public face of an owner account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerProfile {
    pub owner_id: OwnerId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&Owner> for OwnerProfile {
    fn from(owner: &Owner) -> Self {
        Self {
            owner_id: owner.id,
            full_name: owner.full_name.clone(),
            email: owner.email.clone(),
            phone_number: owner.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: String,
    pub owner_id: OwnerId,
}

fn hasher(policy: &PortfolioPolicy) -> Result<Argon2<'static>, PortfolioError> {
    let params = Params::new(policy.hash_memory_kib, policy.hash_iterations, 1, None)
        .map_err(|err| PortfolioError::Credential(err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub(crate) fn hash_password(
    policy: &PortfolioPolicy,
    password: &str,
) -> Result<String, PortfolioError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher(policy)?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PortfolioError::Credential(err.to_string()))
}

/// Checks `password` against a stored PHC string. Cost parameters are read
/// from the hash itself.
pub(crate) fn verify_password(password: &str, stored: &str) -> Result<bool, PortfolioError> {
    let parsed =
        PasswordHash::new(stored).map_err(|err| PortfolioError::Credential(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PortfolioError::Credential(err.to_string())),
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl<S, D> PortfolioService<S, D>
where
    S: PortfolioStore + 'static,
    D: DocumentStore + 'static,
{
    pub fn register(&self, request: SignupRequest) -> Result<OwnerProfile, PortfolioError> {
        let (Some(full_name), Some(email), Some(phone_number)) = (
            filled(request.full_name),
            filled(request.email),
            filled(request.phone_number),
        ) else {
            return Err(PortfolioError::validation("Missing required fields"));
        };
        let password = request
            .password
            .filter(|password| !password.is_empty())
            .ok_or_else(|| PortfolioError::validation("Missing required fields"))?;
        if !email.contains('@') {
            return Err(PortfolioError::validation("Invalid email address"));
        }
        self.check_password_policy(&password)?;

        let password_hash = hash_password(&self.policy, &password)?;
        let owner = self.store.transaction(|tables| {
            if tables.owner_by_email(&email).is_some() {
                return Err(PortfolioError::conflict("Email is already registered"));
            }
            let owner = Owner {
                id: OwnerId(tables.next_id()),
                full_name,
                email,
                phone_number,
                password_hash,
            };
            tables.insert_owner(owner.clone());
            Ok(owner)
        })?;

        info!(owner_id = owner.id.0, "owner registered");
        Ok(OwnerProfile::from(&owner))
    }

    /// Opens a session. Unknown email and wrong password are reported the
    /// same way.
    pub fn login(&self, request: LoginRequest) -> Result<Session, PortfolioError> {
        let (Some(email), Some(password)) = (filled(request.email), request.password) else {
            return Err(PortfolioError::validation("Missing credentials"));
        };

        let candidate = self.read(|tables| {
            tables
                .owner_by_email(&email)
                .map(|owner| (owner.id, owner.password_hash.clone()))
        })?;
        let Some((owner_id, stored)) = candidate else {
            warn!("login rejected");
            return Err(PortfolioError::Unauthenticated);
        };
        if !verify_password(&password, &stored)? {
            warn!(owner_id = owner_id.0, "login rejected");
            return Err(PortfolioError::Unauthenticated);
        }

        let token = uuid::Uuid::new_v4().to_string();
        self.store.transaction(|tables| {
            tables.insert_session(token.clone(), owner_id);
            Ok::<_, PortfolioError>(())
        })?;
        info!(owner_id = owner_id.0, "session opened");
        Ok(Session { token, owner_id })
    }

    pub fn authenticate(&self, token: &str) -> Result<OwnerId, PortfolioError> {
        self.read(|tables| tables.session_owner(token))?
            .ok_or(PortfolioError::Unauthenticated)
    }

    pub fn logout(&self, token: &str) -> Result<(), PortfolioError> {
        let closed = self
            .store
            .transaction(|tables| Ok::<_, PortfolioError>(tables.remove_session(token)))?;
        if let Some(owner_id) = closed {
            info!(owner_id = owner_id.0, "session closed");
        }
        Ok(())
    }

    pub fn reset_password(
        &self,
        owner: OwnerId,
        request: PasswordResetRequest,
    ) -> Result<(), PortfolioError> {
        let (Some(old_password), Some(new_password)) =
            (request.old_password, request.new_password)
        else {
            return Err(PortfolioError::validation("Missing required fields"));
        };

        let stored = self
            .read(|tables| tables.owner(owner).map(|owner| owner.password_hash.clone()))?
            .ok_or(PortfolioError::Unauthenticated)?;
        if !verify_password(&old_password, &stored)? {
            warn!(owner_id = owner.0, "password reset rejected");
            return Err(PortfolioError::validation("Invalid old password"));
        }
        self.check_password_policy(&new_password)?;

        let password_hash = hash_password(&self.policy, &new_password)?;
        self.store.transaction(|tables| {
            let account = tables
                .owner_mut(owner)
                .ok_or(PortfolioError::Unauthenticated)?;
            account.password_hash = password_hash;
            Ok::<_, PortfolioError>(())
        })?;
        info!(owner_id = owner.0, "password updated");
        Ok(())
    }

    pub fn profile(&self, owner: OwnerId) -> Result<OwnerProfile, PortfolioError> {
        self.read(|tables| tables.owner(owner).map(OwnerProfile::from))?
            .ok_or(PortfolioError::NotFound)
    }

    fn check_password_policy(&self, password: &str) -> Result<(), PortfolioError> {
        let minimum = self.policy.min_password_length;
        if password.chars().count() < minimum {
            return Err(PortfolioError::validation(format!(
                "Password must be at least {minimum} characters"
            )));
        }
        Ok(())
    }
}
