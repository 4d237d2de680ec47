/// Per-request identity
///
/// Built from validated access-token claims by the API's auth layer and
/// stored in request extensions.

use serde::{Deserialize, Serialize};

use super::jwt::Claims;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub salon_id: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            salon_id: claims.salon_id.clone(),
        }
    }

    /// True when a record with this `salon_id` belongs to the caller
    pub fn owns(&self, salon_id: &str) -> bool {
        self.salon_id == salon_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_from_claims_and_owns() {
        let claims = Claims::new("uid-1", "uid-1", TokenType::Access);
        let ctx = AuthContext::from_claims(&claims);

        assert_eq!(ctx.user_id, "uid-1");
        assert!(ctx.owns("uid-1"));
        assert!(!ctx.owns("uid-2"));
    }
}
