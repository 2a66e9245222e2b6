use log::{error, info};
use sled::{Db, Tree};

use crate::database::{models::User, store::StoreError};
use crate::utils::generate_id;

const SESSION_TREE: &str = "session";

/// Key-value slot holding the serialized profile of every logged-in user,
/// keyed by bearer token.
pub struct SessionStore {
    database: Db,
    token_length: usize,
}

impl SessionStore {
    pub fn open(path: Option<&str>, token_length: usize) -> Result<Self, StoreError> {
        let database = match path {
            Some(path) => sled::open(path),
            None => sled::Config::new().temporary(true).open()
        }.map_err(|err| {
            error!("Failed to open session store, {}", err);
            StoreError::Session(err.to_string())
        })?;

        Ok(SessionStore { database, token_length })
    }

    fn tree(&self) -> Result<Tree, StoreError> {
        self.database.open_tree(SESSION_TREE).map_err(|err| {
            error!("Failed to open database tree ({}), {}", SESSION_TREE, err);
            StoreError::Session(err.to_string())
        })
    }

    /// Reads every stored profile once, dropping entries that no longer decode.
    pub fn restore(&self) -> Result<Vec<User>, StoreError> {
        let tree = self.tree()?;
        let profiles: Vec<User> = tree.iter()
            .filter_map(|item| item.ok())
            .filter_map(|item| serde_json::from_slice(&item.1).ok())
            .collect::<Vec<_>>();

        info!("Restored {} session(s)", profiles.len());
        Ok(profiles)
    }

    /// Writes the profile under a fresh token and returns the token.
    pub fn save(&self, user: &User) -> Result<String, StoreError> {
        let tree = self.tree()?;
        let token = generate_id(self.token_length);
        let user_vec = serde_json::to_vec(user).map_err(|err| StoreError::Session(err.to_string()))?;

        tree.insert(token.as_bytes(), user_vec).map_err(|err| StoreError::Session(err.to_string()))?;
        tree.flush().map_err(|err| StoreError::Session(err.to_string()))?;
        Ok(token)
    }

    pub fn load(&self, token: &str) -> Result<Option<User>, StoreError> {
        let tree = self.tree()?;
        let user_vec = tree.get(token.as_bytes()).map_err(|err| StoreError::Session(err.to_string()))?;

        Ok(match user_vec {
            Some(user_vec) => serde_json::from_slice(&user_vec).ok(),
            None => None
        })
    }

    /// Removes the slot; returns whether a session existed.
    pub fn clear(&self, token: &str) -> Result<bool, StoreError> {
        let tree = self.tree()?;
        let removed = tree.remove(token.as_bytes()).map_err(|err| StoreError::Session(err.to_string()))?;
        tree.flush().map_err(|err| StoreError::Session(err.to_string()))?;
        Ok(removed.is_some())
    }

    /// Drops every session belonging to the account.
    pub fn clear_user(&self, user_id: &str) -> Result<usize, StoreError> {
        let tree = self.tree()?;
        let tokens = tree.iter()
            .filter_map(|item| item.ok())
            .filter(|item| match serde_json::from_slice::<User>(&item.1) {
                Ok(user) => user.id == user_id,
                Err(_) => false
            })
            .map(|item| item.0)
            .collect::<Vec<_>>();

        for token in &tokens {
            tree.remove(token).map_err(|err| StoreError::Session(err.to_string()))?;
        }
        tree.flush().map_err(|err| StoreError::Session(err.to_string()))?;
        Ok(tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use chrono::Utc;

    fn profile(id: &str) -> User {
        User {
            id: id.to_string(),
            username: String::from("admin"),
            email: String::from("admin@teamfocuz.com"),
            role: Role::Admin,
            name: String::from("System Administrator"),
            created_at: Utc::now(),
            last_login: Some(Utc::now()),
        }
    }

    #[test]
    fn save_load_and_clear() {
        let sessions = SessionStore::open(None, 48).unwrap();
        let user = profile("1");

        let token = sessions.save(&user).unwrap();
        assert_eq!(token.len(), 48);
        assert_eq!(sessions.load(&token).unwrap(), Some(user));
        assert_eq!(sessions.restore().unwrap().len(), 1);

        assert!(sessions.clear(&token).unwrap());
        assert_eq!(sessions.load(&token).unwrap(), None);
        assert!(!sessions.clear(&token).unwrap());
    }

    #[test]
    fn clear_user_drops_only_their_sessions() {
        let sessions = SessionStore::open(None, 16).unwrap();
        sessions.save(&profile("1")).unwrap();
        sessions.save(&profile("1")).unwrap();
        let kept = sessions.save(&profile("2")).unwrap();

        assert_eq!(sessions.clear_user("1").unwrap(), 2);
        assert!(sessions.load(&kept).unwrap().is_some());
    }
}
