use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use axum_macros::debug_handler;
use log::{debug, info};

use crate::{
    error::{Error, Result},
    membership::{self, queue_not_found},
    model::{
        queue::{self, Status},
        AppState,
    },
    wait::{self, QueueView},
};

use super::auth::{Admin, CurrentUser};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueue {
    #[serde(default)]
    pub service_name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct UpdateStatus {
    pub status: Status,
}

#[derive(Debug, serde::Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// Ids that don't parse can't name a queue.
fn parse_id(id: &str) -> Result<queue::Id> {
    id.parse().map_err(|_| queue_not_found())
}

#[debug_handler]
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<QueueView>>> {
    let database = state.database.lock().await;
    let queues = membership::list(&database)?;
    Ok(Json(queues.into_iter().map(wait::annotate).collect()))
}

#[debug_handler]
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<QueueView>> {
    let id = parse_id(&id)?;
    let database = state.database.lock().await;
    Ok(Json(wait::annotate(membership::get(&database, &id)?)))
}

#[debug_handler]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    payload: std::result::Result<Json<CreateQueue>, JsonRejection>,
) -> Result<(StatusCode, Json<QueueView>)> {
    let Json(body) = payload?;
    let service_name = body.service_name.unwrap_or_default();

    let id = state.next_snowflake()?;
    let database = state.database.lock().await;
    let queue = membership::create(&database, id, &service_name)?;

    info!("Admin {} created queue {}", admin.id, queue.id);

    Ok((StatusCode::CREATED, Json(wait::annotate(queue))))
}

#[debug_handler]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Path(id): Path<String>,
) -> Result<Json<Deleted>> {
    let id = parse_id(&id)?;
    let database = state.database.lock().await;
    membership::delete(&database, &id)?;

    info!("Admin {} deleted queue {}", admin.id, id);

    Ok(Json(Deleted {
        message: "Queue deleted",
    }))
}

#[debug_handler]
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateStatus>, JsonRejection>,
) -> Result<Json<QueueView>> {
    let id = parse_id(&id)?;
    let Json(UpdateStatus { status }) =
        payload.map_err(|_| Error::Validation("Status must be \"open\" or \"closed\"".into()))?;

    let database = state.database.lock().await;
    let queue = membership::set_status(&database, &id, status)?;

    info!("Admin {} set queue {} to {}", admin.id, id, status);

    Ok(Json(wait::annotate(queue)))
}

#[debug_handler]
pub async fn join(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<QueueView>> {
    let id = parse_id(&id)?;
    let database = state.database.lock().await;
    let queue = membership::join(&database, &id, &user.id)?;

    debug!(
        "User {} is at position {:?} in queue {}",
        user.id,
        queue.position_of(&user.id),
        id
    );

    Ok(Json(wait::annotate(queue)))
}

#[debug_handler]
pub async fn leave(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<QueueView>> {
    let id = parse_id(&id)?;
    let database = state.database.lock().await;
    let queue = membership::leave(&database, &id, &user.id)?;
    Ok(Json(wait::annotate(queue)))
}
