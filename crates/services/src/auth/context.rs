use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::AuthError;
use super::claims::{Claims, Role};
use super::store::TokenStore;

struct Authenticated {
    token: String,
    claims: Claims,
}

/// Who is signed in, backed by a [`TokenStore`].
///
/// Constructed explicitly and passed to whatever needs it. `init` restores a
/// stored token, `teardown` forgets the cached identity without touching the store.
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    clock: Clock,
    current: Option<Authenticated>,
}

impl SessionContext {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            clock: Clock::default(),
            current: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Restore the stored token, if any.
    ///
    /// A token that cannot be decoded or has expired is removed from the store.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` only when the store itself fails.
    pub fn init(&mut self) -> Result<Option<Role>, AuthError> {
        self.current = None;
        let Some(token) = self.store.load()? else {
            debug!("no stored token");
            return Ok(None);
        };

        match self.accept(&token) {
            Ok(claims) => {
                let role = claims.role();
                info!(sub = %claims.sub, %role, "restored session");
                self.current = Some(Authenticated { token, claims });
                Ok(Some(role))
            }
            Err(err) => {
                warn!(error = %err, "discarding stored token");
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    /// Decode, persist and cache `token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::Expired` without
    /// touching the store, or `AuthError::Store` if persisting fails.
    pub fn login(&mut self, token: &str) -> Result<Role, AuthError> {
        let token = token.trim();
        let claims = self.accept(token)?;
        self.store.save(token)?;

        let role = claims.role();
        info!(sub = %claims.sub, %role, "signed in");
        self.current = Some(Authenticated {
            token: token.to_owned(),
            claims,
        });
        Ok(role)
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the store cannot be cleared. The cached identity
    /// is dropped either way.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.current = None;
        self.store.clear()?;
        info!("signed out");
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.current = None;
    }

    fn accept(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = Claims::decode_unverified(token)?;
        if claims.is_expired(self.clock.now()) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.current.as_ref().map(|auth| &auth.claims)
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.claims().map(Claims::role)
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.role() == Some(Role::Student)
    }

    #[must_use]
    pub fn is_instructor(&self) -> bool {
        self.role() == Some(Role::Instructor)
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.current.as_ref().map(|auth| auth.token.as_str())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("claims", &self.claims())
            .finish_non_exhaustive()
    }
}
