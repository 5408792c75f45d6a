//! Conversations between clients, workers and staff.

use cleanit_database::{
    Conversation, ConversationRepository, CreateConversationRequest, CreateMessageRequest,
    Message, Page, SqlitePool, User, UserRepository,
};
use cleanit_users::utils::validation::validate_text;
use cleanit_users::Permission;
use tracing::info;

use super::access::require;
use crate::types::{DomainEvent, EventBus, NewConversation, OperationError, OperationResult};

const MESSAGE_MAX_CHARS: usize = 2000;

#[derive(Clone)]
pub struct ConversationService {
    conversations: ConversationRepository,
    users: UserRepository,
    events: EventBus,
}

impl ConversationService {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            events,
        }
    }

    /// Open a conversation. The creator always takes part.
    pub async fn create(&self, actor: &User, input: NewConversation) -> OperationResult<Conversation> {
        require(actor, Permission::UseChat)?;

        if let Some(title) = input.title.as_deref() {
            validate_text("title", title, 100)?;
        }

        let mut participants = vec![actor.public_id.clone()];
        for participant in input.participants {
            if participants.contains(&participant) {
                continue;
            }
            match self.users.find_by_public_id(&participant).await? {
                Some(user) if user.is_active => participants.push(user.public_id),
                Some(_) => {
                    return Err(OperationError::validation(format!("user {participant} is inactive")))
                }
                None => return Err(OperationError::not_found("user", participant)),
            }
        }

        if participants.len() < 2 {
            return Err(OperationError::validation("a conversation needs another participant"));
        }

        let conversation = self
            .conversations
            .create(&CreateConversationRequest {
                title: input.title,
                building_id: input.building_id,
                job_id: input.job_id,
                participants,
            })
            .await?;

        info!(
            actor = %actor.public_id,
            conversation = %conversation.public_id,
            participants = conversation.participants.len(),
            "conversation opened"
        );
        Ok(conversation)
    }

    pub async fn list(&self, actor: &User, page: Page) -> OperationResult<Vec<Conversation>> {
        require(actor, Permission::UseChat)?;
        Ok(self.conversations.list_for_user(&actor.public_id, page).await?)
    }

    pub async fn get(&self, actor: &User, public_id: &str) -> OperationResult<Conversation> {
        require(actor, Permission::UseChat)?;

        let conversation = self
            .conversations
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| OperationError::not_found("conversation", public_id))?;

        if !conversation.has_participant(&actor.public_id) {
            return Err(OperationError::permission_denied("not a participant of this conversation"));
        }

        Ok(conversation)
    }

    /// Messages oldest first.
    pub async fn messages(&self, actor: &User, public_id: &str, page: Page) -> OperationResult<Vec<Message>> {
        let conversation = self.get(actor, public_id).await?;
        Ok(self
            .conversations
            .list_messages(&conversation.public_id, page)
            .await?)
    }

    pub async fn post(&self, actor: &User, public_id: &str, content: &str) -> OperationResult<Message> {
        let conversation = self.get(actor, public_id).await?;
        validate_text("message", content, MESSAGE_MAX_CHARS)?;

        let message = self
            .conversations
            .add_message(&CreateMessageRequest {
                conversation_id: conversation.public_id.clone(),
                sender_id: actor.public_id.clone(),
                content: content.to_string(),
            })
            .await?;

        self.events.publish(
            DomainEvent::MessagePosted {
                conversation_id: conversation.public_id,
                message_id: message.public_id.clone(),
                sender_id: message.sender_id.clone(),
            },
            conversation.participants,
            None,
        );

        Ok(message)
    }
}
