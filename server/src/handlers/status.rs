use actix_web::{error, web, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::admin::AdminCommand;
use crate::server::{ServerCommand, ServerTx};

pub fn configure_status_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/health")
            .name("health")
            .route(web::get().to(health)),
    )
    .service(
        web::resource("/room/{room_id}")
            .name("room_status")
            .route(web::get().to(show_room)),
    );
}

fn submit(srv_tx: &ServerTx, command: AdminCommand) -> Result<()> {
    srv_tx
        .send(ServerCommand::AdminCommand(command))
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))
}

pub async fn health(srv_tx: web::Data<ServerTx>) -> Result<HttpResponse> {
    let (tx, rx) = oneshot::channel();
    submit(srv_tx.get_ref(), AdminCommand::GetServerStatus { tx })?;

    let status = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;
    Ok(HttpResponse::Ok().json(status))
}

#[derive(Deserialize)]
pub struct ShowRoomParam {
    room_id: String,
}

pub async fn show_room(
    path: web::Path<ShowRoomParam>,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse> {
    let (tx, rx) = oneshot::channel();
    submit(
        srv_tx.get_ref(),
        AdminCommand::GetRoomStatus {
            room_key: path.into_inner().room_id,
            tx,
        },
    )?;

    let status = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;
    Ok(match status {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().json(json!({ "error": "Room not found" })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{spawn_server, ServerSettings};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::time::Duration;
    use system::message::{InboundEvent, JoinRoom};
    use system::{RoomStatus, ServerStatus};

    fn settings() -> ServerSettings {
        ServerSettings {
            grace_period: Duration::from_secs(300),
            history_limit: 100,
        }
    }

    #[actix_web::test]
    async fn it_reports_empty_server_health() {
        let srv_tx = spawn_server(settings());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(srv_tx))
                .configure(configure_status_handlers),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let status: ServerStatus = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.rooms, 0);
        assert_eq!(status.total_users, 0);
        assert_eq!(status.connections, 0);
    }

    #[actix_web::test]
    async fn it_returns_not_found_for_unknown_room() {
        let srv_tx = spawn_server(settings());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(srv_tx))
                .configure(configure_status_handlers),
        )
        .await;

        let req = test::TestRequest::get().uri("/room/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn it_describes_joined_room() {
        let srv_tx = spawn_server(settings());
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        srv_tx.send(ServerCommand::Connect { tx }).expect("");
        let connection_id = match rx.recv().await {
            Some(crate::connection::ConnectionEvent::Connected { connection_id }) => connection_id,
            other => panic!("unexpected {:?}", other),
        };
        srv_tx
            .send(ServerCommand::Inbound {
                from: connection_id,
                event: InboundEvent::JoinRoom(JoinRoom {
                    room_id: "R1".into(),
                    username: "Alice".into(),
                    color: "#ff0000".into(),
                }),
            })
            .expect("");

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(srv_tx))
                .configure(configure_status_handlers),
        )
        .await;

        let req = test::TestRequest::get().uri("/room/R1").to_request();
        let status: RoomStatus = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status.room_id, "R1");
        assert_eq!(status.users.len(), 1);
        assert_eq!(status.history_length, 0);
        assert!(!status.has_state);
    }
}
