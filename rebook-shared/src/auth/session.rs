/// Sign-up, sign-in and sign-out
///
/// Wraps the identity provider with the salon bookkeeping that goes with it:
/// signing up creates the salon with its display name, and signing in creates
/// a bare salon (email only) if the account predates it.
///
/// Every state change is published on [`AuthEvents`], a process-wide
/// broadcast channel. Subscribers that fall behind lose the oldest events;
/// publishing never blocks and never fails when nobody is listening.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::identity::{DynIdentityProvider, IdentityError, IdentityUser};
use crate::models::salon::{NewSalon, Salon};
use crate::store::{DynStore, StoreError};

/// Buffered events per subscriber
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedUp { user_id: String, salon_id: String },
    SignedIn { user_id: String, salon_id: String },
    SignedOut { user_id: String },
}

/// Auth state change notifications
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event, returning how many subscribers received it
    pub fn publish(&self, event: AuthEvent) -> usize {
        debug!(?event, "Publishing auth event");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A signed-in user and their salon
#[derive(Debug, Clone)]
pub struct Session {
    pub user: IdentityUser,
    pub salon: Salon,
}

#[derive(Clone)]
pub struct SessionService {
    store: DynStore,
    identity: DynIdentityProvider,
    events: AuthEvents,
}

impl SessionService {
    pub fn new(store: DynStore, identity: DynIdentityProvider, events: AuthEvents) -> Self {
        Self {
            store,
            identity,
            events,
        }
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Creates the account and its salon
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        salon_name: &str,
    ) -> Result<Session, SessionError> {
        let user = self.identity.sign_up(email, password).await?;
        let salon = self
            .store
            .create_salon_if_absent(NewSalon {
                id: user.uid.clone(),
                email: user.email.clone(),
                salon_name: Some(salon_name.to_string()),
            })
            .await?;

        info!(user_id = %user.uid, "Salon account created");
        self.events.publish(AuthEvent::SignedUp {
            user_id: user.uid.clone(),
            salon_id: salon.id.clone(),
        });

        Ok(Session { user, salon })
    }

    /// Verifies credentials, creating the salon record on first sign-in
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let user = self.identity.sign_in(email, password).await?;
        let salon = match self.store.get_salon(&user.uid).await? {
            Some(salon) => salon,
            None => {
                info!(user_id = %user.uid, "Creating salon on first sign-in");
                self.store
                    .create_salon_if_absent(NewSalon {
                        id: user.uid.clone(),
                        email: user.email.clone(),
                        salon_name: None,
                    })
                    .await?
            }
        };

        self.events.publish(AuthEvent::SignedIn {
            user_id: user.uid.clone(),
            salon_id: salon.id.clone(),
        });

        Ok(Session { user, salon })
    }

    pub fn sign_out(&self, user_id: &str) {
        self.events.publish(AuthEvent::SignedOut {
            user_id: user_id.to_string(),
        });
    }
}
