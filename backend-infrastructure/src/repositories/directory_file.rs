use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use backend_domain::{Directory, DirectoryRepository};

/// Users and events kept in a YAML file, used to seed the database.
pub struct DirectoryFileRepository;

impl DirectoryFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirectoryFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryRepository for DirectoryFileRepository {
    async fn load_directory(&self, path: &str) -> anyhow::Result<Directory> {
        if !Path::new(path).exists() {
            return Ok(Directory::default());
        }
        let content = fs::read_to_string(path).await?;
        let directory: Directory = serde_yaml::from_str(&content)?;
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use backend_domain::{EventId, UserId, UserRole};

    use super::*;

    fn temp_path() -> String {
        std::env::temp_dir()
            .join(format!("hearth-{}", uuid::Uuid::new_v4()))
            .join("directory.yaml")
            .to_string_lossy()
            .to_string()
    }

    #[tokio::test]
    async fn missing_file_is_empty_directory() {
        let repo = DirectoryFileRepository::new();
        let directory = repo.load_directory(&temp_path()).await.expect("load");
        assert!(directory.users.is_empty());
        assert!(directory.events.is_empty());
    }

    #[tokio::test]
    async fn parses_hand_written_yaml() {
        let path = temp_path();
        if let Some(parent) = Path::new(&path).parent() {
            fs::create_dir_all(parent).await.expect("dir");
        }
        fs::write(
            &path,
            r#"
users:
  - id: google_1
    name: Ada Lovelace
    role: organizer
  - id: google_2
    name: Grace Hopper
    email: grace@example.com
    role: approved
events:
  - id: 10
    title: Board games
    starts_at: 2026-07-01T18:00:00Z
    max_attendees: 8
    organizer_id: google_1
"#,
        )
        .await
        .expect("write");

        let directory = DirectoryFileRepository::new()
            .load_directory(&path)
            .await
            .expect("load");
        assert_eq!(directory.users.len(), 2);
        assert_eq!(directory.users[0].role, UserRole::Organizer);
        assert_eq!(directory.users[0].email, "");
        let event = &directory.events[0];
        assert_eq!(event.id, EventId(10));
        assert_eq!(event.organizer_id, UserId::from("google_1"));
        assert_eq!(event.max_attendees, Some(8));
        assert!(event.is_active);
        assert_eq!(event.co_host_id, None);

        let _ = fs::remove_dir_all(Path::new(&path).parent().expect("parent")).await;
    }
}
