//! SSE push-stream handlers.

use crate::stream::StreamManager;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;

/// Open the long-lived push stream for a user.
///
/// Each open is an independent subscription, so client retries are
/// idempotent. The connection closes when the client goes away; the
/// manager prunes the dead sender on the next delivery.
///
/// GET /api/v1/notifications/stream/{user_id}
pub async fn stream_notifications(
    path: web::Path<Uuid>,
    manager: web::Data<Arc<StreamManager>>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let rx = manager.subscribe(user_id).await;

    let body = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .map(|event| -> Result<web::Bytes, actix_web::Error> {
        let frame = event
            .to_sse()
            .map_err(actix_web::error::ErrorInternalServerError)?;
        Ok(web::Bytes::from(frame))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(body))
}

/// Stream connection status for a user.
///
/// GET /api/v1/notifications/stream-status/{user_id}
pub async fn stream_status(
    path: web::Path<Uuid>,
    manager: web::Data<Arc<StreamManager>>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let connection_count = manager.connection_count(user_id).await;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id.to_string(),
        "connected": connection_count > 0,
        "connection_count": connection_count
    })))
}

/// Aggregate stream stats.
///
/// GET /api/v1/notifications/stream-stats
pub async fn stream_stats(manager: web::Data<Arc<StreamManager>>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "total_connections": manager.total_connections().await,
        "connected_users": manager.connected_users_count().await,
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/v1/notifications/stream/{user_id}",
        web::get().to(stream_notifications),
    )
    .route(
        "/api/v1/notifications/stream-status/{user_id}",
        web::get().to(stream_status),
    )
    .route(
        "/api/v1/notifications/stream-stats",
        web::get().to(stream_stats),
    );
}
