use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::users::domain::{Listing, PartialRecord, UserId, UserRecord};

/// Trait abstraction over user storage, consumed by the HTTP layer.
///
/// Each call is atomic with respect to every other call on the same store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, record: UserRecord) -> (UserId, UserRecord);
    async fn list(&self) -> Listing;
    async fn get(&self, id: UserId) -> Result<UserRecord, ServiceError>;
    async fn update(&self, id: UserId, partial: PartialRecord) -> Result<UserRecord, ServiceError>;
    async fn delete(&self, id: UserId) -> Result<UserRecord, ServiceError>;
}
