use async_trait::async_trait;

use crate::users::{
    error::DirectoryError,
    model::{PublicUser, UserId, UserRecord},
};

/// Identity store used by the web layer. The in-memory [`UserDirectory`] is
/// one implementation; a durable backend would expose the same surface.
///
/// [`UserDirectory`]: crate::users::directory::UserDirectory
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a user. Email and name are normalized first; the email must
    /// not already be taken.
    async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, DirectoryError>;

    /// Full record including the credential hash. Trusted callers only.
    async fn find_by_email(&self, email: &str) -> Option<UserRecord>;

    async fn find_by_id(&self, id: UserId) -> Option<PublicUser>;

    /// `false` both for an unknown id and for a wrong password.
    async fn verify_credential(&self, id: UserId, candidate: &str) -> bool;

    async fn list_all(&self) -> Vec<PublicUser>;
}
