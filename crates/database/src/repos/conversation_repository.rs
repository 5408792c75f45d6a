//! Conversation and message repository.

use crate::entities::{Conversation, CreateConversationRequest, CreateMessageRequest, Message};
use crate::types::{DatabaseError, DatabaseResult, Page};
use crate::{new_public_id, timestamp_now};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const CONVERSATION_COLUMNS: &str = "id, public_id, title, building_id, job_id, last_message, last_message_at, created_at, updated_at";

#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateConversationRequest) -> DatabaseResult<Conversation> {
        let now = timestamp_now();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (public_id, title, building_id, job_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.title)
        .bind(&request.building_id)
        .bind(&request.job_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for participant in &request.participants {
            sqlx::query(
                "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id) VALUES (?, ?)",
            )
            .bind(&public_id)
            .bind(participant)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.require(&public_id).await
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Conversation>> {
        let query = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let participants = self.participants(public_id).await?;
                Ok(Some(conversation_from_row(&row, participants)?))
            }
            None => Ok(None),
        }
    }

    async fn require(&self, public_id: &str) -> DatabaseResult<Conversation> {
        self.find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("conversation", public_id))
    }

    async fn participants(&self, conversation_id: &str) -> DatabaseResult<Vec<String>> {
        let participants = sqlx::query_scalar(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = ? ORDER BY user_id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Conversations the user takes part in, most recently active first.
    pub async fn list_for_user(&self, user_id: &str, page: Page) -> DatabaseResult<Vec<Conversation>> {
        let query = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS} FROM conversations
            WHERE public_id IN (SELECT conversation_id FROM conversation_participants WHERE user_id = ?)
            ORDER BY COALESCE(last_message_at, created_at) DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let public_id: String = row.try_get("public_id")?;
            let participants = self.participants(&public_id).await?;
            conversations.push(conversation_from_row(row, participants)?);
        }

        Ok(conversations)
    }

    /// Store a message and move it into the conversation's preview fields.
    pub async fn add_message(&self, request: &CreateMessageRequest) -> DatabaseResult<Message> {
        let now = timestamp_now();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE conversations SET last_message = ?, last_message_at = ?, updated_at = ? WHERE public_id = ?",
        )
        .bind(&request.content)
        .bind(&now)
        .bind(&now)
        .bind(&request.conversation_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("conversation", &request.conversation_id));
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO messages (public_id, conversation_id, sender_id, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.conversation_id)
        .bind(&request.sender_id)
        .bind(&request.content)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message {
            id: insert.last_insert_rowid(),
            public_id,
            conversation_id: request.conversation_id.clone(),
            sender_id: request.sender_id.clone(),
            content: request.content.clone(),
            created_at: now,
        })
    }

    /// Messages oldest first.
    pub async fn list_messages(&self, conversation_id: &str, page: Page) -> DatabaseResult<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT id, public_id, conversation_id, sender_id, content, created_at
            FROM messages WHERE conversation_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(conversation_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }
}

fn conversation_from_row(row: &SqliteRow, participants: Vec<String>) -> DatabaseResult<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        title: row.try_get("title")?,
        building_id: row.try_get("building_id")?,
        job_id: row.try_get("job_id")?,
        participants,
        last_message: row.try_get("last_message")?,
        last_message_at: row.try_get("last_message_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &SqliteRow) -> DatabaseResult<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialize_in_memory;
    use crate::repos::job_repository::tests::seed;

    #[tokio::test]
    async fn test_conversation_with_messages() {
        let pool = initialize_in_memory().await.unwrap();
        let seeded = seed(&pool).await;
        let repo = ConversationRepository::new(pool);

        let conversation = repo
            .create(&CreateConversationRequest {
                title: Some("Tower cleaning".to_string()),
                building_id: Some(seeded.building_id.clone()),
                job_id: None,
                participants: vec![
                    seeded.owner_id.clone(),
                    seeded.worker_id.clone(),
                    seeded.owner_id.clone(),
                ],
            })
            .await
            .unwrap();
        assert_eq!(conversation.participants.len(), 2);
        assert!(conversation.has_participant(&seeded.worker_id));
        assert!(conversation.last_message.is_none());

        repo.add_message(&CreateMessageRequest {
            conversation_id: conversation.public_id.clone(),
            sender_id: seeded.owner_id.clone(),
            content: "Hello".to_string(),
        })
        .await
        .unwrap();
        repo.add_message(&CreateMessageRequest {
            conversation_id: conversation.public_id.clone(),
            sender_id: seeded.worker_id.clone(),
            content: "On my way".to_string(),
        })
        .await
        .unwrap();

        let messages = repo
            .list_messages(&conversation.public_id, Page::default())
            .await
            .unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Hello", "On my way"]);

        let listed = repo.list_for_user(&seeded.worker_id, Page::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_message.as_deref(), Some("On my way"));

        assert!(repo
            .list_for_user("stranger", Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_message_to_missing_conversation() {
        let pool = initialize_in_memory().await.unwrap();
        let seeded = seed(&pool).await;
        let repo = ConversationRepository::new(pool);

        let error = repo
            .add_message(&CreateMessageRequest {
                conversation_id: "missing".to_string(),
                sender_id: seeded.owner_id,
                content: "anyone?".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(error, DatabaseError::NotFound(_)));
    }
}
