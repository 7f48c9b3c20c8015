use actix::io::{SinkWrite, WriteHandler};
use actix::*;
use actix_codec::Framed;
use awc::error::WsProtocolError;
use awc::ws::{Codec, Frame, Message as WsMessage};
use awc::BoxedSocket;
use futures::stream::{SplitSink, StreamExt};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::models::{ConnectionId, SocketEvent, SocketEventKind};
use crate::websocket::channel::{ConnectRequest, ConnectionHandle, Connector};

type WsSink = SplitSink<Framed<BoxedSocket, Codec>, WsMessage>;

/// One client websocket connection to a game
pub struct GameSocket {
    connection: ConnectionId,
    sink: SinkWrite<WsMessage, WsSink>,
    owner: WeakRecipient<SocketEvent>,
}

/// Asks a socket to close
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSocket;

impl GameSocket {
    fn notify(&self, kind: SocketEventKind) {
        match self.owner.upgrade() {
            Some(owner) => owner.do_send(SocketEvent {
                connection: self.connection,
                kind,
            }),
            None => warn!("Channel for {} is gone, dropping {:?}", self.connection, kind),
        }
    }
}

impl Actor for GameSocket {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.connection);
        self.notify(SocketEventKind::Opened);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("WebSocket connection closed: {}", self.connection);
        self.notify(SocketEventKind::Closed);
    }
}

impl Handler<CloseSocket> for GameSocket {
    type Result = ();

    fn handle(&mut self, _: CloseSocket, ctx: &mut Self::Context) {
        if self.sink.write(WsMessage::Close(None)).is_err() {
            warn!("Could not send close frame on {}", self.connection);
        }
        self.sink.close();
        ctx.stop();
    }
}

impl WriteHandler<WsProtocolError> for GameSocket {}

// WebSocket frame handler
impl StreamHandler<std::result::Result<Frame, WsProtocolError>> for GameSocket {
    fn handle(&mut self, msg: std::result::Result<Frame, WsProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(Frame::Text(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => self.notify(SocketEventKind::Text(text.to_string())),
                Err(e) => warn!("Dropping non UTF-8 text frame: {}", e),
            },
            Ok(Frame::Ping(bytes)) => {
                if self.sink.write(WsMessage::Pong(bytes)).is_err() {
                    warn!("Could not answer ping on {}", self.connection);
                }
            }
            Ok(Frame::Pong(_)) => {}
            Ok(Frame::Binary(_)) | Ok(Frame::Continuation(_)) => {
                warn!("Binary messages are not supported");
            }
            Ok(Frame::Close(reason)) => {
                info!("Connection closed by server: {:?}", reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("WebSocket error: {}", e);
                ctx.stop();
            }
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        ctx.stop();
    }
}

enum HandleState {
    Connecting,
    Cancelled,
    Live(Addr<GameSocket>),
    Closed,
}

/// Handle to a connection opened by `WsConnector`
pub struct WsHandle {
    state: Rc<RefCell<HandleState>>,
}

impl ConnectionHandle for WsHandle {
    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        match std::mem::replace(&mut *state, HandleState::Closed) {
            HandleState::Connecting => *state = HandleState::Cancelled,
            HandleState::Live(addr) => addr.do_send(CloseSocket),
            HandleState::Cancelled => *state = HandleState::Cancelled,
            HandleState::Closed => {}
        }
    }
}

/// Opens game sockets with `awc`, passing the access token as the subprotocol
pub struct WsConnector {
    owner: WeakRecipient<SocketEvent>,
}

impl WsConnector {
    pub fn new(owner: WeakRecipient<SocketEvent>) -> Self {
        WsConnector { owner }
    }
}

impl Connector for WsConnector {
    type Handle = WsHandle;

    fn connect(&mut self, request: ConnectRequest) -> Result<WsHandle> {
        let state = Rc::new(RefCell::new(HandleState::Connecting));
        let shared = state.clone();
        let owner = self.owner.clone();

        actix::spawn(async move {
            let ConnectRequest {
                connection,
                url,
                credential,
                ..
            } = request;
            let result = awc::Client::new()
                .ws(url.as_str())
                .protocols([credential.as_str()])
                .connect()
                .await;
            let cancelled = matches!(*shared.borrow(), HandleState::Cancelled);

            match result {
                Err(e) => {
                    warn!("WebSocket connection to {} failed: {}", url, e);
                    if let Some(owner) = owner.upgrade() {
                        owner.do_send(SocketEvent {
                            connection,
                            kind: SocketEventKind::Closed,
                        });
                    }
                }
                Ok(_) if cancelled => {
                    info!("Connection {} was closed while connecting", connection);
                }
                Ok((_response, framed)) => {
                    let (sink, stream) = framed.split();
                    let addr = GameSocket::create(|ctx| {
                        GameSocket::add_stream(stream, ctx);
                        GameSocket {
                            connection,
                            sink: SinkWrite::new(sink, ctx),
                            owner,
                        }
                    });
                    *shared.borrow_mut() = HandleState::Live(addr);
                }
            }
        });

        Ok(WsHandle { state })
    }
}
