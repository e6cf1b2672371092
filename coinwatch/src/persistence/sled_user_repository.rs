use crate::domain::User;
use crate::ports::UserRepository;
use async_trait::async_trait;
use shared::{Error, Result};
use sled::Db;
use std::path::Path;

const USERS_TREE: &str = "users";

fn storage_error(err: sled::Error) -> Error {
    Error::Persistence(err.to_string())
}

fn serialization_error(err: serde_json::Error) -> Error {
    Error::Persistence(format!("corrupt user record: {}", err))
}

/// Sled-backed user records, stored as JSON keyed by user id
#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).map_err(storage_error)?;
        Ok(Self { db })
    }

    fn users_tree(&self) -> Result<sled::Tree> {
        self.db.open_tree(USERS_TREE).map_err(storage_error)
    }
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users_tree = self.users_tree()?;

        match users_tree.get(id.as_bytes()).map_err(storage_error)? {
            Some(user_data) => {
                let user: User = serde_json::from_slice(&user_data).map_err(serialization_error)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, user: User) -> Result<User> {
        let users_tree = self.users_tree()?;
        let user_json = serde_json::to_vec(&user).map_err(serialization_error)?;

        users_tree
            .insert(user.id.as_bytes(), user_json)
            .map_err(storage_error)?;
        users_tree.flush_async().await.map_err(storage_error)?;

        Ok(user)
    }
}

impl std::fmt::Debug for SledUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledUserRepository")
            .field("size_on_disk", &self.db.size_on_disk().ok())
            .finish()
    }
}
