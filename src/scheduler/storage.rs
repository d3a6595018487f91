use chrono::Utc;
use log::error;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::location::{NewLocation, Owner, WatchedLocation};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Location not found: {0}")]
    NotFound(Uuid),
    #[error("No email address known for owner {0:?}")]
    UnknownOwner(Owner),
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Read side of the location store consumed by the scheduler.
pub trait LocationStore: Send + Sync {
    /// Locations with `notify = true`.
    fn list_notifiable_locations(&self) -> Result<Vec<WatchedLocation>, StorageError>;

    fn owner_email(&self, location: &WatchedLocation) -> Result<String, StorageError>;
}

/// Keeps one YAML document per location under `<base>/locations`.
pub struct FileLocationStore {
    base: PathBuf,
    users: HashMap<String, String>,
}

impl FileLocationStore {
    /// `users` maps user names to their email addresses.
    pub fn new(base: PathBuf, users: impl IntoIterator<Item = (String, String)>) -> Self {
        FileLocationStore {
            base,
            users: users.into_iter().collect(),
        }
    }

    fn locations_path(&self) -> PathBuf {
        self.base.join("locations")
    }

    fn location_path(&self, id: Uuid) -> PathBuf {
        self.locations_path().join(format!("{}.yaml", id))
    }

    pub fn list_locations(&self) -> Result<Vec<WatchedLocation>, StorageError> {
        let path = self.locations_path();

        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut locations = Vec::new();
        for entry in path.read_dir()? {
            let entry = entry?;
            let entry_path = entry.path();

            if !entry_path.is_file() {
                continue;
            }

            let content = match std::fs::read_to_string(&entry_path) {
                Ok(content) => content,
                Err(e) => {
                    error!("Failed to read location file {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            match serde_yaml::from_str::<WatchedLocation>(&content) {
                Ok(location) => locations.push(location),
                Err(e) => {
                    error!("Failed to parse location {}: {}", entry_path.display(), e);
                    continue;
                }
            }
        }

        locations.sort_by_key(|l| l.created_at);
        Ok(locations)
    }

    pub fn list_owned(&self, owner: &Owner) -> Result<Vec<WatchedLocation>, StorageError> {
        Ok(self
            .list_locations()?
            .into_iter()
            .filter(|l| &l.owner == owner)
            .collect())
    }

    pub fn get_location(&self, id: Uuid) -> Result<WatchedLocation, StorageError> {
        let path = self.location_path(id);

        if !path.exists() {
            return Err(StorageError::NotFound(id));
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn submit_location(
        &self,
        new: NewLocation,
        owner: Owner,
    ) -> Result<WatchedLocation, StorageError> {
        let location = WatchedLocation::from_new(new, owner, Utc::now())?;
        self.save_location(&location)?;
        Ok(location)
    }

    pub fn delete_location(&self, id: Uuid) -> Result<(), StorageError> {
        let path = self.location_path(id);

        if !path.exists() {
            return Err(StorageError::NotFound(id));
        }

        std::fs::remove_file(path)?;
        Ok(())
    }

    fn save_location(&self, location: &WatchedLocation) -> Result<(), StorageError> {
        std::fs::create_dir_all(self.locations_path())?;

        let path = self.location_path(location.id);
        std::fs::write(path, serde_yaml::to_string(location)?)?;
        Ok(())
    }
}

impl LocationStore for FileLocationStore {
    fn list_notifiable_locations(&self) -> Result<Vec<WatchedLocation>, StorageError> {
        Ok(self
            .list_locations()?
            .into_iter()
            .filter(|l| l.notify)
            .collect())
    }

    fn owner_email(&self, location: &WatchedLocation) -> Result<String, StorageError> {
        match &location.owner {
            Owner::Email(email) => Ok(email.clone()),
            Owner::User(name) => self
                .users
                .get(name)
                .cloned()
                .ok_or_else(|| StorageError::UnknownOwner(location.owner.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FileLocationStore {
        FileLocationStore::new(
            dir.path().to_path_buf(),
            [("alice".to_string(), "alice@example.com".to_string())],
        )
    }

    fn new_location(name: &str, notify: bool) -> NewLocation {
        NewLocation {
            name: Some(name.to_string()),
            latitude: 34.05,
            longitude: -118.25,
            notification_lead_time: Some(48),
            cloud_coverage_threshold: None,
            notify: Some(notify),
        }
    }

    #[test]
    fn submit_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let saved = store
            .submit_location(new_location("LA", true), Owner::User("alice".into()))
            .unwrap();
        let loaded = store.get_location(saved.id).unwrap();

        assert_eq!(loaded.name, "LA");
        assert_eq!(loaded.notification_lead_time, 48);
        assert_eq!(loaded.owner, Owner::User("alice".into()));
        assert_eq!(loaded.created_at, saved.created_at);
    }

    #[test]
    fn notifiable_excludes_muted_locations() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let owner = Owner::User("alice".into());

        store.submit_location(new_location("on", true), owner.clone()).unwrap();
        store.submit_location(new_location("off", false), owner).unwrap();

        let notifiable = store.list_notifiable_locations().unwrap();
        assert_eq!(notifiable.len(), 1);
        assert_eq!(notifiable[0].name, "on");
        assert_eq!(store.list_locations().unwrap().len(), 2);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .submit_location(new_location("ok", true), Owner::Email("b@example.com".into()))
            .unwrap();
        std::fs::write(dir.path().join("locations").join("junk.yaml"), "::: nope").unwrap();

        assert_eq!(store.list_notifiable_locations().unwrap().len(), 1);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).list_locations().unwrap().is_empty());
    }

    #[test]
    fn list_owned_filters_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .submit_location(new_location("mine", true), Owner::User("alice".into()))
            .unwrap();
        store
            .submit_location(new_location("theirs", true), Owner::User("bob".into()))
            .unwrap();

        let owned = store.list_owned(&Owner::User("alice".into())).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name, "mine");
    }

    #[test]
    fn delete_missing_location() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            store(&dir).delete_location(id),
            Err(StorageError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn owner_email_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let by_user = store
            .submit_location(new_location("a", true), Owner::User("alice".into()))
            .unwrap();
        let direct = store
            .submit_location(new_location("b", true), Owner::Email("c@example.com".into()))
            .unwrap();
        let unknown = store
            .submit_location(new_location("c", true), Owner::User("mallory".into()))
            .unwrap();

        assert_eq!(store.owner_email(&by_user).unwrap(), "alice@example.com");
        assert_eq!(store.owner_email(&direct).unwrap(), "c@example.com");
        assert!(matches!(
            store.owner_email(&unknown),
            Err(StorageError::UnknownOwner(_))
        ));
    }

    #[test]
    fn submit_rejects_invalid_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = new_location("bad", true);
        bad.latitude = 123.0;
        assert!(matches!(
            store(&dir).submit_location(bad, Owner::User("alice".into())),
            Err(StorageError::InvalidLocation(_))
        ));
    }
}
