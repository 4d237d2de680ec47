/// Authentication
///
/// # Modules
///
/// - [`identity`]: password checks delegated to an external identity provider
/// - [`session`]: sign-up/sign-in/sign-out with salon bookkeeping and auth events
/// - [`jwt`]: the API's own HS256 access and refresh tokens
/// - [`context`]: the caller identity attached to each authenticated request
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use rebook_shared::auth::identity::MemoryIdentity;
/// use rebook_shared::auth::jwt::issue_tokens;
/// use rebook_shared::auth::session::{AuthEvents, SessionService};
/// use rebook_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionService::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryIdentity::new()),
///     AuthEvents::default(),
/// );
///
/// let session = sessions.sign_up("owner@glow.example", "secret1", "Glow Studio").await?;
/// let tokens = issue_tokens(&session.user.uid, &session.salon.id, "a-signing-secret-of-32-bytes!!!!")?;
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod identity;
pub mod jwt;
pub mod session;
