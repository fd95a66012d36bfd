use super::{keys, Hooks};
use crate::api::types::{ApiKey, CreateApiKeyRequest, CreatedApiKey};
use crate::cache::{CacheEffects, Mutation, Query};

impl Hooks {
    pub fn api_keys(&self) -> Query<Vec<ApiKey>> {
        self.query(keys::api_keys(), |client| async move { client.list_api_keys().await })
    }

    /// The returned secret is not cached; only the key list is refreshed
    pub fn create_api_key(&self) -> Mutation<CreateApiKeyRequest, CreatedApiKey> {
        self.mutation(
            "create_api_key",
            |client, request: CreateApiKeyRequest| async move { client.create_api_key(&request).await },
            |_, _| CacheEffects::new().invalidate(keys::api_keys()),
        )
    }

    /// Payload is the key id
    pub fn revoke_api_key(&self) -> Mutation<String, ()> {
        self.mutation(
            "revoke_api_key",
            |client, key_id: String| async move { client.revoke_api_key(&key_id).await },
            |_, _| CacheEffects::new().invalidate(keys::api_keys()),
        )
    }
}
