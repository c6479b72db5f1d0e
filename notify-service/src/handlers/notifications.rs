//! Notification HTTP handlers: create, unread fetch, mark read.

use crate::batch::BatchDispatcher;
use crate::config::Config;
use crate::store::NotificationStore;
use actix_web::{web, HttpResponse};
use notify_types::{
    ApiResponse, CreateNotificationRequest, MarkReadRequest, Notification, NotificationKind,
    Priority,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Create a notification: persist it, then hand it to the delivery
/// pipeline (direct push or batching, by priority).
///
/// POST /api/v1/notifications
pub async fn create_notification(
    store: web::Data<Arc<dyn NotificationStore>>,
    dispatcher: web::Data<Arc<BatchDispatcher>>,
    req: web::Json<CreateNotificationRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let kind = NotificationKind::parse(&req.kind);
    let priority = Priority::parse(req.priority.as_deref().unwrap_or("normal"));

    let mut notification =
        Notification::new(req.recipient_id, kind, req.title, req.message).with_priority(priority);
    if let Some(metadata) = req.metadata {
        notification = notification.with_metadata(metadata);
    }

    store.insert(notification.clone()).await?;
    dispatcher.submit(notification.clone()).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(notification)))
}

/// Unread feed for a user; backs poll mode and manual refresh.
///
/// GET /api/v1/notifications/unread/{user_id}
pub async fn unread_feed(
    store: web::Data<Arc<dyn NotificationStore>>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let feed = store.unread_feed(user_id, config.store.feed_limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(feed)))
}

/// Mark notifications read: explicit ids, or everything.
///
/// POST /api/v1/notifications/read/{user_id}
pub async fn mark_read(
    store: web::Data<Arc<dyn NotificationStore>>,
    path: web::Path<Uuid>,
    req: web::Json<MarkReadRequest>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let req = req.into_inner();

    let flipped = if req.mark_all {
        store.mark_all_read(user_id).await?
    } else if req.notification_ids.is_empty() {
        return Err(AppError::BadRequest(
            "notification_ids or mark_all required".to_string(),
        ));
    } else {
        store.mark_read(user_id, &req.notification_ids).await?
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "marked": flipped }))))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications")
            .route("", web::post().to(create_notification))
            .route("/unread/{user_id}", web::get().to(unread_feed))
            .route("/read/{user_id}", web::post().to(mark_read)),
    );
}
