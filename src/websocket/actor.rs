use actix::*;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::models::{AppState, GameId, SocketEvent};
use crate::websocket::channel::{ChannelEffect, ChannelPhase, Connector, SyncChannel};
use crate::websocket::handler::WsConnector;

/// Owns the realtime channel for the current view.
///
/// All socket notifications pass through this actor's mailbox, so server
/// events are applied one at a time in receipt order. Sockets only hold weak
/// references back to it: dropping the last `Addr` stops the actor, and
/// stopping tears the connection down.
pub struct ChannelActor<C: Connector = WsConnector> {
    app_state: Arc<AppState>,
    channel: SyncChannel<C>,
    /// Delayed result for a finished game, cancelled when the channel leaves that game
    pending_result: Option<(GameId, SpawnHandle)>,
}

/// Binds the channel to a game, or closes it with `None`
#[derive(Message)]
#[rtype(result = "crate::Result<()>")]
pub struct Activate(pub Option<GameId>);

/// Binds the channel to whatever game the shared state holds
#[derive(Message)]
#[rtype(result = "crate::Result<()>")]
pub struct SyncWithState;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Teardown;

#[derive(Message)]
#[rtype(result = "ChannelPhase")]
pub struct QueryPhase;

impl ChannelActor<WsConnector> {
    pub fn start_with(app_state: Arc<AppState>, ws_url: String, result_delay: Duration) -> Addr<ChannelActor> {
        Self::start_with_connector(app_state, WsConnector::new, ws_url, result_delay)
    }

    pub fn start(app_state: Arc<AppState>, config: &ClientConfig) -> Addr<ChannelActor> {
        Self::start_with(app_state, config.ws_url.clone(), config.result_delay)
    }
}

impl<C> ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    /// Starts the actor with a connector built from its own weak address.
    pub fn start_with_connector<F>(
        app_state: Arc<AppState>,
        make_connector: F,
        ws_url: String,
        result_delay: Duration,
    ) -> Addr<ChannelActor<C>>
    where
        F: FnOnce(WeakRecipient<SocketEvent>) -> C + 'static,
    {
        ChannelActor::create(move |ctx| {
            let connector = make_connector(ctx.address().recipient().downgrade());
            ChannelActor {
                channel: SyncChannel::new(connector, app_state.clone(), ws_url, result_delay),
                app_state,
                pending_result: None,
            }
        })
    }

    fn apply(&mut self, effect: ChannelEffect, ctx: &mut Context<Self>) {
        match effect {
            ChannelEffect::ShowResultAfter { delay, winner } => {
                let Some(game_id) = self.channel.game_id() else {
                    return;
                };
                self.cancel_pending_result(ctx);
                let handle = ctx.run_later(delay, move |act, _| {
                    act.pending_result = None;
                    act.app_state.show_result(winner);
                });
                self.pending_result = Some((game_id, handle));
            }
        }
    }

    /// Drops a scheduled result that belongs to a game the channel no longer serves.
    fn drop_stale_result(&mut self, ctx: &mut Context<Self>) {
        if let Some((game_id, _)) = self.pending_result {
            if self.channel.game_id() != Some(game_id) {
                self.cancel_pending_result(ctx);
            }
        }
    }

    fn cancel_pending_result(&mut self, ctx: &mut Context<Self>) {
        if let Some((game_id, handle)) = self.pending_result.take() {
            info!("Cancelling pending result for game {}", game_id);
            ctx.cancel_future(handle);
        }
    }
}

impl<C> Actor for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Context = Context<Self>;

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        info!("Channel owner stopping, tearing down connection");
        self.channel.teardown();
        Running::Stop
    }
}

impl<C> Handler<Activate> for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Result = crate::Result<()>;

    fn handle(&mut self, msg: Activate, ctx: &mut Self::Context) -> Self::Result {
        let result = self.channel.activate(msg.0);
        self.drop_stale_result(ctx);
        result
    }
}

impl<C> Handler<SyncWithState> for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Result = crate::Result<()>;

    fn handle(&mut self, _: SyncWithState, ctx: &mut Self::Context) -> Self::Result {
        let result = self.channel.sync_with_state();
        self.drop_stale_result(ctx);
        result
    }
}

impl<C> Handler<Teardown> for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Result = ();

    fn handle(&mut self, _: Teardown, ctx: &mut Self::Context) {
        self.channel.teardown();
        self.cancel_pending_result(ctx);
    }
}

impl<C> Handler<QueryPhase> for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Result = MessageResult<QueryPhase>;

    fn handle(&mut self, _: QueryPhase, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.channel.phase())
    }
}

impl<C> Handler<SocketEvent> for ChannelActor<C>
where
    C: Connector + Unpin + 'static,
    C::Handle: Unpin + 'static,
{
    type Result = ();

    fn handle(&mut self, msg: SocketEvent, ctx: &mut Self::Context) {
        if let Some(effect) = self.channel.handle_event(msg) {
            self.apply(effect, ctx);
        }
    }
}
