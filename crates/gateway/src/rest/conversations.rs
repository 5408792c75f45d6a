//! Chat endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use cleanit_database::{Conversation, Message, Page};
use cleanit_operations::NewConversation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::AuthUser;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub title: Option<String>,
    pub building_id: Option<String>,
    pub job_id: Option<String>,
    pub participants: Vec<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Conversation> for ConversationResponse {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.public_id,
            title: conversation.title,
            building_id: conversation.building_id,
            job_id: conversation.job_id,
            participants: conversation.participants,
            last_message: conversation.last_message,
            last_message_at: conversation.last_message_at,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.public_id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationBody {
    pub title: Option<String>,
    pub building_id: Option<String>,
    pub job_id: Option<String>,
    /// Other participants; the caller is always added
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageBody {
    pub content: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create conversation routes
pub fn create_conversation_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/conversations", get(list_conversations).post(create_conversation))
        .route("/api/conversations/:conversation_id", get(get_conversation))
        .route(
            "/api/conversations/:conversation_id/messages",
            get(list_messages).post(post_message),
        )
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversations",
    params(PageQuery),
    responses(
        (status = 200, description = "Conversations the caller takes part in", body = Vec<ConversationResponse>),
        (status = 403, description = "Missing use_chat", body = ErrorResponse)
    )
)]
pub async fn list_conversations(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> GatewayResult<Json<Vec<ConversationResponse>>> {
    let conversations = state
        .conversation_service()
        .list(&auth.user, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(conversations.into_iter().map(ConversationResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Conversations",
    request_body = CreateConversationBody,
    responses(
        (status = 201, description = "Conversation opened", body = ConversationResponse),
        (status = 400, description = "Too few or inactive participants", body = ErrorResponse),
        (status = 403, description = "Missing use_chat", body = ErrorResponse)
    )
)]
pub async fn create_conversation(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateConversationBody>,
) -> GatewayResult<(StatusCode, Json<ConversationResponse>)> {
    let conversation = state
        .conversation_service()
        .create(
            &auth.user,
            NewConversation {
                title: body.title,
                building_id: body.building_id,
                job_id: body.job_id,
                participants: body.participants,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(conversation.into())))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "The conversation", body = ConversationResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
) -> GatewayResult<Json<ConversationResponse>> {
    let conversation = state
        .conversation_service()
        .get(&auth.user, &conversation_id)
        .await?;
    Ok(Json(conversation.into()))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Conversations",
    params(
        ("conversation_id" = String, Path, description = "Conversation id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<MessageResponse>),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    )
)]
pub async fn list_messages(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let messages = state
        .conversation_service()
        .messages(&auth.user, &conversation_id, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    request_body = PostMessageBody,
    responses(
        (status = 201, description = "Message posted", body = MessageResponse),
        (status = 400, description = "Empty or oversized message", body = ErrorResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse)
    )
)]
pub async fn post_message(
    State(state): State<Arc<GatewayState>>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
    Json(body): Json<PostMessageBody>,
) -> GatewayResult<(StatusCode, Json<MessageResponse>)> {
    let message = state
        .conversation_service()
        .post(&auth.user, &conversation_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}
