use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use system::message::{InboundEvent, OutboundEvent};
use system::ConnectionId;

use crate::config::Config;
use crate::connection_tx_storage::ConnectionTx;
use crate::server::{ServerCommand, ServerTx};

const CONNECTION_BUFFER: usize = 256;

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    Outbound(OutboundEvent),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    /// Waiting for the server to assign an id. Inbound events are queued.
    Idle {
        pending: Vec<InboundEvent>,
        tx: Option<ConnectionTx>,
    },
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl ConnectionActor {
    fn new(srv_tx: ServerTx) -> Self {
        Self {
            state: ConnectionState::Idle {
                pending: Vec::new(),
                tx: None,
            },
            srv_tx,
        }
    }

    fn send_to_server(&self, command: ServerCommand) {
        if self.srv_tx.send(command).is_err() {
            log::warn!("Server task is gone; dropping command");
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(CONNECTION_BUFFER);

        let own_tx = tx.clone();
        if self.srv_tx.send(ServerCommand::Connect { tx }).is_err() {
            log::warn!("Server task is gone; refusing connection");
            ctx.stop();
            return;
        }
        if let ConnectionState::Idle { ref mut tx, .. } = self.state {
            *tx = Some(own_tx);
        }

        let addr = ctx.address();

        actix_web::rt::spawn(async move {
            log::debug!("connection forwarder - started");
            while let Some(msg) = rx.recv().await {
                if !addr.connected() {
                    break;
                }
                addr.do_send(ConnectionActorMessage(msg));
            }
            log::debug!("connection forwarder - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        match self.state {
            ConnectionState::Connected(from) => {
                self.send_to_server(ServerCommand::Disconnect { from })
            }
            ConnectionState::Idle {
                tx: Some(ref tx), ..
            } => self.send_to_server(ServerCommand::Abandon { tx: tx.clone() }),
            ConnectionState::Idle { tx: None, .. } => (),
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => {
                log::debug!("Ingress size: {}", text.len());
                let event = match InboundEvent::from_json(&text) {
                    Ok(event) => event,
                    Err(err) => {
                        log::debug!("Dropped malformed frame: {}", err);
                        return;
                    }
                };
                match self.state {
                    ConnectionState::Connected(from) => {
                        self.send_to_server(ServerCommand::Inbound { from, event })
                    }
                    ConnectionState::Idle {
                        ref mut pending, ..
                    } => pending.push(event),
                }
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::warn!("WebSocket protocol error: {}", err);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Connected { connection_id } => {
                let previous =
                    std::mem::replace(&mut self.state, ConnectionState::Connected(connection_id));
                if let ConnectionState::Idle { pending, .. } = previous {
                    for event in pending {
                        self.send_to_server(ServerCommand::Inbound {
                            from: connection_id,
                            event,
                        });
                    }
                }
            }
            ConnectionEvent::Outbound(event) => match event.to_json() {
                Ok(text) => {
                    log::debug!("Egress size: {}", text.len());
                    ctx.text(text);
                }
                Err(err) => log::warn!("Failed to encode outbound event: {}", err),
            },
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    ws::WsResponseBuilder::new(ConnectionActor::new(srv_tx.get_ref().clone()), &req, stream)
        .frame_size(config.max_frame_size)
        .start()
}
