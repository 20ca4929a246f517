//! Chat service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{MethodRouter, get, post},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult},
    representers::{
        MessageInput, MessageRepresenter, RoomInput, RoomRepresenter, UserInput, UserRepresenter,
    },
    state::AppState,
};

type JsonBody<T> = WithRejection<Json<T>, ApiError>;
type IdPath = WithRejection<Path<i64>, ApiError>;

/// Query parameters for user listing
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// Comma-separated user IDs, e.g. `ids=1,2,3`
    pub ids: Option<String>,
}

impl UserQuery {
    fn parse_ids(&self) -> ApiResult<Option<Vec<i64>>> {
        let Some(ids) = self.ids.as_deref() else {
            return Ok(None);
        };

        ids.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| ApiError::field("ids", format!("\"{}\" is not a valid id.", id)))
            })
            .collect::<ApiResult<Vec<i64>>>()
            .map(Some)
    }
}

/// Query parameters for message listing
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "roomId")]
    pub room_id: Option<i64>,
}

/// Create the router for the chat service
///
/// Every path answers with and without a trailing slash (`/users` and
/// `/users/`).
pub fn create_router(state: AppState) -> Router {
    let routes: [(&str, MethodRouter<AppState>); 8] = [
        ("/health", get(health_check)),
        ("/register", post(create_user)),
        ("/users", get(get_users).post(create_user)),
        ("/users/:id", get(get_user).patch(update_user)),
        ("/messages", get(get_messages).post(create_message)),
        ("/messages/:id", get(get_message).patch(update_message)),
        ("/rooms", get(get_rooms).post(create_room)),
        (
            "/rooms/:id",
            get(get_room).patch(update_room).delete(delete_room),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router
                .route(path, method_router.clone())
                .route(&format!("{}/", path), method_router)
        })
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "chat-service"
    }))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    context: Option<RequestContext>,
    WithRejection(Json(payload), _): JsonBody<UserInput>,
) -> ApiResult<impl IntoResponse> {
    let representer = UserRepresenter::new(state.users.as_ref(), context.as_ref());
    let user = representer.create(payload).await?;

    Ok((StatusCode::CREATED, Json(representer.represent(&user))))
}

/// List users, optionally restricted to `ids`
pub async fn get_users(
    State(state): State<AppState>,
    context: Option<RequestContext>,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    let ids = query.parse_ids()?;
    let users = state.users.list(ids.as_deref()).await?;

    let representer = UserRepresenter::new(state.users.as_ref(), context.as_ref());
    let users: Vec<_> = users.iter().map(|user| representer.represent(user)).collect();
    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    context: Option<RequestContext>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let representer = UserRepresenter::new(state.users.as_ref(), context.as_ref());
    Ok(Json(representer.represent(&user)))
}

/// Partially update a user
pub async fn update_user(
    State(state): State<AppState>,
    context: Option<RequestContext>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UserInput>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let representer = UserRepresenter::new(state.users.as_ref(), context.as_ref());
    let user = representer.update(&user, payload).await?;
    Ok(Json(representer.represent(&user)))
}

fn message_representer(state: &AppState) -> MessageRepresenter<'_> {
    MessageRepresenter::new(
        state.messages.as_ref(),
        state.rooms.as_ref(),
        state.users.as_ref(),
    )
}

/// List messages, optionally for a single room
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.messages.list(query.room_id).await?;

    let representer = message_representer(&state);
    let messages: Vec<_> = messages
        .iter()
        .map(|message| representer.represent(message))
        .collect();
    Ok(Json(messages))
}

/// Post a message
pub async fn create_message(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<MessageInput>,
) -> ApiResult<impl IntoResponse> {
    let representer = message_representer(&state);
    let message = representer.create(payload).await?;

    Ok((StatusCode::CREATED, Json(representer.represent(&message))))
}

/// Get a message by ID
pub async fn get_message(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .messages
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(message_representer(&state).represent(&message)))
}

/// Partially update a message
pub async fn update_message(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<MessageInput>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .messages
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let representer = message_representer(&state);
    let message = representer.update(&message, payload).await?;
    Ok(Json(representer.represent(&message)))
}

fn room_representer(state: &AppState) -> RoomRepresenter<'_> {
    RoomRepresenter::new(state.rooms.as_ref(), state.users.as_ref())
}

/// List rooms
pub async fn get_rooms(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rooms = state.rooms.list().await?;

    let representer = room_representer(&state);
    let rooms: Vec<_> = rooms.iter().map(|room| representer.represent(room)).collect();
    Ok(Json(rooms))
}

/// Open a room
pub async fn create_room(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<RoomInput>,
) -> ApiResult<impl IntoResponse> {
    let representer = room_representer(&state);
    let room = representer.create(payload).await?;

    Ok((StatusCode::CREATED, Json(representer.represent(&room))))
}

/// Get a room by ID
pub async fn get_room(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    let room = state.rooms.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(room_representer(&state).represent(&room)))
}

/// Partially update a room
pub async fn update_room(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<RoomInput>,
) -> ApiResult<impl IntoResponse> {
    let room = state.rooms.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let representer = room_representer(&state);
    let room = representer.update(&room, payload).await?;
    Ok(Json(representer.represent(&room)))
}

/// Delete a room and its messages
pub async fn delete_room(
    State(state): State<AppState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<impl IntoResponse> {
    if !state.rooms.delete(id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Room {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let query = UserQuery {
            ids: Some("1, 2,,3".to_string()),
        };
        assert_eq!(query.parse_ids().unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(UserQuery::default().parse_ids().unwrap(), None);
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        let query = UserQuery {
            ids: Some("1,abc".to_string()),
        };
        assert!(matches!(query.parse_ids(), Err(ApiError::Validation(_))));
    }
}
