use async_trait::async_trait;

use super::{Token, TokenPatch};
use crate::shared::errors::StoreResult;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or replace the token keyed by its `uid`, stamping `last_updated`.
    async fn set_token(&self, token: Token) -> StoreResult<()>;
    async fn lookup_token(&self, uid: &str) -> StoreResult<Option<Token>>;
    /// Apply `patch` to the token `uid` owned by the given party, atomically.
    /// `None` when no such token exists for that party.
    async fn patch_token(
        &self,
        country_code: &str,
        party_id: &str,
        uid: &str,
        patch: TokenPatch,
    ) -> StoreResult<Option<Token>>;
}
