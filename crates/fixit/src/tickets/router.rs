use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, BuildingId, CommentId, Role, TicketId, TicketStatus, UserId};
use super::service::{AssignmentRequest, CreateTicketRequest, TicketError, TicketService};
use super::store::{BuildingDirectory, StoreError, TicketNotifier, TicketStore, UserDirectory};
use super::transition::TransitionError;

/// Router builder exposing the ticket lifecycle operations over HTTP.
/// Every response uses the uniform `{ success, data?, error? }` envelope.
pub fn ticket_router<S, D, N>(service: Arc<TicketService<S, D, N>>) -> Router
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    Router::new()
        .route("/api/v1/tickets", post(create_handler::<S, D, N>))
        .route(
            "/api/v1/tickets/:ticket_id",
            get(get_handler::<S, D, N>).delete(delete_handler::<S, D, N>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/transition",
            post(transition_handler::<S, D, N>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/assign",
            post(assign_handler::<S, D, N>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/force-complete",
            post(force_complete_handler::<S, D, N>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/comments",
            get(list_comments_handler::<S, D, N>).post(add_comment_handler::<S, D, N>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/comments/:comment_id",
            delete(delete_comment_handler::<S, D, N>),
        )
        .with_state(service)
}

/// Actor fields resolved by the external API layer, carried either as query
/// parameters (reads, deletes) or flattened into mutation bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorContext {
    pub actor_id: String,
    pub actor_name: String,
    pub role: Role,
    pub building_id: String,
    #[serde(default)]
    pub super_admin: bool,
}

impl ActorContext {
    fn into_actor(self) -> Actor {
        Actor {
            id: UserId(self.actor_id),
            name: self.actor_name,
            role: self.role,
            building_id: BuildingId(self.building_id),
            super_admin: self.super_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub status: TicketStatus,
    #[serde(flatten)]
    pub actor: ActorContext,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub technician_id: String,
    pub technician_name: String,
    pub assigned_by: String,
    pub assigned_by_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ForceCompleteBody {
    #[serde(flatten)]
    pub actor: ActorContext,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(flatten)]
    pub actor: ActorContext,
    pub content: String,
}

pub(crate) async fn create_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    axum::Json(request): axum::Json<CreateTicketRequest>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    match service.create(request) {
        Ok(stored) => success(StatusCode::CREATED, stored.ticket),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn get_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    Query(actor): Query<ActorContext>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = actor.into_actor();
    match service.get(&TicketId(ticket_id), &actor) {
        Ok(view) => success(StatusCode::OK, view),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn transition_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    axum::Json(body): axum::Json<TransitionBody>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = body.actor.into_actor();
    match service.transition(&TicketId(ticket_id), body.status, &actor, body.note) {
        Ok(stored) => success(StatusCode::OK, stored.ticket),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn assign_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    axum::Json(body): axum::Json<AssignBody>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let request = AssignmentRequest {
        ticket_id: TicketId(ticket_id),
        technician_id: UserId(body.technician_id),
        technician_name: body.technician_name,
        assigned_by: UserId(body.assigned_by),
        assigned_by_name: body.assigned_by_name,
    };
    match service.assign(request) {
        Ok(stored) => success(StatusCode::OK, stored.ticket),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn force_complete_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    axum::Json(body): axum::Json<ForceCompleteBody>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = body.actor.into_actor();
    match service.force_complete(&TicketId(ticket_id), &actor, body.note) {
        Ok(stored) => success(StatusCode::OK, stored.ticket),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn delete_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    Query(actor): Query<ActorContext>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = actor.into_actor();
    match service.delete(&TicketId(ticket_id), &actor) {
        Ok(()) => success(StatusCode::OK, json!({ "deleted": true })),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn list_comments_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    Query(actor): Query<ActorContext>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = actor.into_actor();
    match service.comments(&TicketId(ticket_id), &actor) {
        Ok(comments) => success(StatusCode::OK, comments),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn add_comment_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path(ticket_id): Path<String>,
    axum::Json(body): axum::Json<CommentBody>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = body.actor.into_actor();
    match service.add_comment(&TicketId(ticket_id), &actor, body.content) {
        Ok(comment) => success(StatusCode::CREATED, comment),
        Err(err) => failure(&err),
    }
}

pub(crate) async fn delete_comment_handler<S, D, N>(
    State(service): State<Arc<TicketService<S, D, N>>>,
    Path((ticket_id, comment_id)): Path<(String, String)>,
    Query(actor): Query<ActorContext>,
) -> Response
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    let actor = actor.into_actor();
    match service.delete_comment(&TicketId(ticket_id), &actor, &CommentId(comment_id)) {
        Ok(()) => success(StatusCode::OK, json!({ "deleted": true })),
        Err(err) => failure(&err),
    }
}

fn success<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    let payload = json!({
        "success": true,
        "data": data,
    });
    (status, axum::Json(payload)).into_response()
}

fn failure(err: &TicketError) -> Response {
    let payload = json!({
        "success": false,
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        },
    });
    (status_for(err), axum::Json(payload)).into_response()
}

fn status_for(err: &TicketError) -> StatusCode {
    match err {
        TicketError::Validation(_) => StatusCode::BAD_REQUEST,
        TicketError::Transition(TransitionError::Denied(_))
        | TicketError::NotAdmin
        | TicketError::NotATechnician
        | TicketError::ReadDenied
        | TicketError::DeleteDenied
        | TicketError::CommentDenied => StatusCode::FORBIDDEN,
        TicketError::TicketNotFound
        | TicketError::CommentNotFound
        | TicketError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        TicketError::Transition(TransitionError::IllegalStep { .. })
        | TicketError::AlreadyAssigned
        | TicketError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        TicketError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
