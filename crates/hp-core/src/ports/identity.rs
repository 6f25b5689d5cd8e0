use async_trait::async_trait;

use crate::ids::UserId;

/// Resolves the signed-in account, if any.
#[async_trait]
pub trait CurrentUserPort: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}
