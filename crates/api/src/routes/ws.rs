//! `/hubs/auction` — the persistent WebSocket subscription endpoint.
//!
//! One task per connection: a reader half dispatches client-invoked
//! methods (`JoinAuction`, `LeaveAuction`, `RequestTimerSync`, `PlaceBid`)
//! against the coordinator and the fabric, while room/user events are
//! funneled into one outbound mpsc channel a writer half drains onto the
//! socket. Authentication happens once, at the handshake, via the
//! `access_token` query parameter (a bearer header cannot be set on a
//! browser WebSocket handshake).

use crate::state::AppState;
use auction_coordinator as coordinator;
use auction_domain::{AuctionId, Event, UserId};
use auction_events::EventBus;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "method", content = "params")]
enum ClientMessage {
    JoinAuction(AuctionId),
    LeaveAuction(AuctionId),
    RequestTimerSync(AuctionId),
    PlaceBid { auction_id: AuctionId, amount: Decimal },
}

pub async fn upgrade(
    State(state): State<AppState>,
    Query(query): Query<HandshakeQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    match state.auth.validate_access_token(&query.access_token) {
        Ok(claims) => match claims.user_id() {
            Ok(user_id) => ws.on_upgrade(move |socket| handle_connection(socket, state, user_id)).into_response(),
            Err(_) => axum::http::StatusCode::UNAUTHORIZED.into_response(),
        },
        Err(_) => axum::http::StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn handle_connection(socket: WebSocket, state: AppState, user_id: UserId) {
    let (mut sink, mut stream) = futures::StreamExt::split(socket);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Event>(64);

    let (user_sub, mut user_rx) = state.events.register_user(user_id);
    let forward_tx = outbound_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = user_rx.recv().await {
            if forward_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let mut room_tasks: HashMap<AuctionId, tokio::task::JoinHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(event) => {
                        let Ok(text) = serde_json::to_string(&event) else { continue };
                        if futures::SinkExt::send(&mut sink, Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = futures::StreamExt::next(&mut stream) => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, &state, user_id, &outbound_tx, &mut room_tasks).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    for (_, handle) in room_tasks {
        handle.abort();
    }
    state.events.unregister_user(user_id, user_sub);
}

async fn handle_client_message(
    text: &str,
    state: &AppState,
    user_id: UserId,
    outbound_tx: &mpsc::Sender<Event>,
    room_tasks: &mut HashMap<AuctionId, tokio::task::JoinHandle<()>>,
) {
    let Ok(message) = serde_json::from_str::<ClientMessage>(text) else {
        return;
    };
    match message {
        ClientMessage::JoinAuction(auction_id) => {
            if room_tasks.contains_key(&auction_id) {
                return;
            }
            let mut room_rx = state.events.join_room(auction_id);
            let tx = outbound_tx.clone();
            let handle = tokio::spawn(async move {
                loop {
                    match room_rx.recv().await {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
            room_tasks.insert(auction_id, handle);
        }
        ClientMessage::LeaveAuction(auction_id) => {
            if let Some(handle) = room_tasks.remove(&auction_id) {
                handle.abort();
            }
        }
        ClientMessage::RequestTimerSync(auction_id) => {
            send_timer_sync(state, auction_id, outbound_tx).await;
        }
        ClientMessage::PlaceBid { auction_id, amount } => {
            let _ = coordinator::place_bid(&state.deps, auction_id, user_id, amount, None).await;
            // The accepted bid's events reach this connection through the
            // room/user channels it already subscribes to; failures are
            // silent over the socket by design (see the HTTP endpoint for
            // a request that surfaces the rejection reason).
        }
    }
}

async fn send_timer_sync(state: &AppState, auction_id: AuctionId, outbound_tx: &mpsc::Sender<Event>) {
    use auction_domain::{events::TimerSyncEvent, Clock};
    if let Ok(Some((auction, _))) = state.deps.store.load_auction_with_top_bid(auction_id).await {
        let now = state.deps.clock.now();
        let event = Event::TimerSync(TimerSyncEvent {
            auction_id,
            end_at: auction.end_at,
            time_remaining_secs: (auction.end_at - now).num_seconds().max(0),
            server_time: now,
        });
        let _ = outbound_tx.send(event).await;
    }
}

