use async_trait::async_trait;

use crate::{
    domain::{Package, User, UserId},
    Result,
};

/// Port to the persistent store of users and packages.
///
/// Postgres is the first implementation; the shape is small enough that an
/// in-memory implementation backs the core tests.
#[async_trait]
pub trait StorePort: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>>;
    /// Case-insensitive exact match on display name.
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn list_admins(&self) -> Result<Vec<User>>;
    /// Fails with [`crate::Error::DuplicateUser`] if the id is taken.
    async fn add_user(&self, user: &User) -> Result<()>;
    /// Fails with [`crate::Error::UnknownUser`] if the user is absent.
    async fn remove_user(&self, user: &User) -> Result<()>;

    async fn find_package(&self, id: i64) -> Result<Option<Package>>;
    async fn add_package(&self, package: &Package) -> Result<()>;
    async fn list_uncollected_packages(&self) -> Result<Vec<Package>>;
    async fn mark_collected(&self, package: &Package) -> Result<()>;
    /// 0 for an empty store. Read once at startup to seed the id allocator.
    async fn max_package_id(&self) -> Result<i64>;
}

/// Port for delivering a text message to a platform user.
///
/// Best-effort from the core's perspective: handlers log a failed send and
/// carry on with their remaining effects.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn send(&self, recipient: &UserId, text: &str) -> Result<()>;
}

/// Port for resolving a display name at registration time.
///
/// Failure here degrades to a placeholder name; registration proceeds.
#[async_trait]
pub trait ProfilePort: Send + Sync {
    async fn resolve_display_name(&self, id: &UserId) -> Result<String>;
}
