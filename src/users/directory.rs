use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::users::{
    error::DirectoryError,
    model::{PublicUser, UserId, UserRecord},
    password::CredentialHasher,
    services::{normalize_email, normalize_name},
    store::UserStore,
};

struct Table {
    records: BTreeMap<UserId, UserRecord>,
    by_email: HashMap<String, UserId>,
    next_id: UserId,
}

impl Table {
    fn empty() -> Self {
        Self {
            records: BTreeMap::new(),
            by_email: HashMap::new(),
            next_id: UserId::FIRST,
        }
    }
}

/// Process-local user table.
///
/// All state sits behind a single lock. `create` hashes with no lock held and
/// then checks, assigns the id, and inserts under one write guard, so two
/// racing registrations for the same email cannot both succeed and a failed
/// registration never consumes an id.
pub struct UserDirectory {
    table: RwLock<Table>,
    hasher: CredentialHasher,
}

impl UserDirectory {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self {
            table: RwLock::new(Table::empty()),
            hasher,
        }
    }

    /// Drops every record and restarts ids at 1. Test and bootstrap use only.
    pub async fn reset(&self) {
        let mut table = self.table.write().await;
        *table = Table::empty();
        warn!("user directory reset");
    }

    async fn email_taken(&self, email: &str) -> bool {
        self.table.read().await.by_email.contains_key(email)
    }
}

#[async_trait]
impl UserStore for UserDirectory {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, DirectoryError> {
        let email = normalize_email(email);
        let name = normalize_name(name);

        // Cheap early exit; the authoritative check happens under the write lock.
        if self.email_taken(&email).await {
            debug!(email = %email, "duplicate email rejected before hashing");
            return Err(DirectoryError::DuplicateUser { email });
        }

        let password_hash = self.hasher.hash_async(password).await?;

        let user = {
            let mut table = self.table.write().await;
            if table.by_email.contains_key(&email) {
                return Err(DirectoryError::DuplicateUser { email });
            }

            let id = table.next_id;
            table.next_id = id.next();

            let now = OffsetDateTime::now_utc();
            let record = UserRecord {
                id,
                name,
                email: email.clone(),
                password_hash,
                is_admin: false,
                created_at: now,
                updated_at: now,
            };
            let user = record.to_public();
            table.by_email.insert(email, id);
            table.records.insert(id, record);
            user
        };

        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let email = normalize_email(email);
        let table = self.table.read().await;
        table
            .by_email
            .get(&email)
            .and_then(|id| table.records.get(id))
            .cloned()
    }

    async fn find_by_id(&self, id: UserId) -> Option<PublicUser> {
        self.table
            .read()
            .await
            .records
            .get(&id)
            .map(UserRecord::to_public)
    }

    async fn verify_credential(&self, id: UserId, candidate: &str) -> bool {
        let hash = match self.table.read().await.records.get(&id) {
            Some(record) => record.password_hash.clone(),
            None => return false,
        };

        match self.hasher.verify_async(candidate, hash).await {
            Ok(ok) => ok,
            Err(e) => {
                error!(user_id = %id, error = %e, "credential verification failed");
                false
            }
        }
    }

    async fn list_all(&self) -> Vec<PublicUser> {
        self.table
            .read()
            .await
            .records
            .values()
            .map(UserRecord::to_public)
            .collect()
    }
}
