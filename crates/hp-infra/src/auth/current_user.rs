use std::sync::Arc;

use async_trait::async_trait;
use hp_core::ports::{AuthTokenPort, CurrentUserPort};
use hp_core::UserId;
use tracing::warn;

/// Current user decoded from the stored access token.
pub struct TokenCurrentUser {
    tokens: Arc<dyn AuthTokenPort>,
}

impl TokenCurrentUser {
    pub fn new(tokens: Arc<dyn AuthTokenPort>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl CurrentUserPort for TokenCurrentUser {
    async fn current_user(&self) -> Option<UserId> {
        match self.tokens.load().await {
            Ok(tokens) => tokens.and_then(|t| t.user_id()),
            Err(err) => {
                warn!(error = %err, "failed to read stored token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FileTokenStore;
    use hp_core::auth::AuthTokens;
    use tempfile::TempDir;

    // {"user_id":42}
    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VyX2lkIjo0Mn0.sig";

    #[tokio::test]
    async fn test_current_user_from_stored_token() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileTokenStore::new(dir.path().join("auth.json")));
        let current = TokenCurrentUser::new(store.clone());

        assert_eq!(current.current_user().await, None);

        store
            .save(&AuthTokens {
                access: TOKEN.to_string(),
                refresh: None,
            })
            .await
            .unwrap();
        assert_eq!(current.current_user().await, Some(UserId::new(42)));
    }
}
