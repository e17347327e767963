use async_trait::async_trait;

use crate::models::{Chat, Message, User};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
}

impl BackendError {
    /// Transient failures are worth retrying with backoff; rejected
    /// credentials are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}

/// Upstream data source for the current user and their chat history.
///
/// The real chat API is not wired up yet; `SampleBackend` stands in for
/// it. Anything implementing this trait can be injected in its place.
#[async_trait]
pub trait Backend {
    async fn fetch_user(&self) -> Result<User, BackendError>;
    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>, BackendError>;
}

/// Canned data source: one fixed user with two seeded conversations.
pub struct SampleBackend {
    user: User,
    chats: Vec<Chat>,
}

impl SampleBackend {
    pub fn new() -> Self {
        let user_id = uuid::Uuid::new_v4().to_string();
        let user = User {
            id: user_id.clone(),
            name: "Great Stack".to_string(),
            email: "greatstack@example.com".to_string(),
            password: String::new(),
            credits: 200,
        };
        let chats = vec![
            seed_chat(
                &user_id,
                "New Chat",
                "2025-07-16T10:54:13.982Z",
                vec![
                    seed_message("user", "Hi, how are you?", 1_752_663_196_066),
                    seed_message(
                        "assistant",
                        "I'm doing well, thank you! How can I help you today?",
                        1_752_663_197_589,
                    ),
                ],
            ),
            seed_chat(
                &user_id,
                "Trip planning",
                "2025-07-18T08:12:44.103Z",
                vec![
                    seed_message("user", "Plan a weekend trip to the coast.", 1_752_826_364_103),
                    seed_message(
                        "assistant",
                        "Here's a two-day itinerary: start Saturday morning...",
                        1_752_826_366_251,
                    ),
                ],
            ),
        ];
        Self { user, chats }
    }
}

impl Default for SampleBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SampleBackend {
    async fn fetch_user(&self) -> Result<User, BackendError> {
        Ok(self.user.clone())
    }

    async fn fetch_chats(&self, user_id: &str) -> Result<Vec<Chat>, BackendError> {
        Ok(self
            .chats
            .iter()
            .filter(|chat| chat.user_id == user_id)
            .cloned()
            .collect())
    }
}

fn seed_chat(user_id: &str, name: &str, created_at: &str, messages: Vec<Message>) -> Chat {
    Chat {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        user_name: Some("Great Stack".to_string()),
        name: name.to_string(),
        messages,
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
    }
}

fn seed_message(role: &str, content: &str, timestamp: i64) -> Message {
    Message {
        is_image: false,
        is_published: false,
        role: role.to_string(),
        content: content.to_string(),
        timestamp,
    }
}
