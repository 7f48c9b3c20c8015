pub mod actor;
pub mod channel;
pub mod handler;

pub use actor::{Activate, ChannelActor, QueryPhase, SyncWithState, Teardown};
pub use channel::{ChannelEffect, ChannelPhase, ConnectRequest, ConnectionHandle, Connector, SyncChannel};
pub use handler::{GameSocket, WsConnector};
