//! The real-time messaging fabric (C3).
//!
//! Three addressing modes over one in-process hub: group (room-scoped,
//! keyed by auction id), per-user (delivered to every live connection of
//! one bidder), and broadcast (every connected client). `auction-api`'s
//! WebSocket sessions are the only callers of the subscribe/register side;
//! `auction-coordinator` is the only caller of the publish side.

mod hub;

pub use hub::EventHub;

use auction_domain::{AuctionId, Event, UserId};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// A room's receive buffer. Slow subscribers fall behind and start missing
/// the oldest events (`broadcast::error::RecvError::Lagged`) rather than
/// blocking the publisher.
pub const ROOM_CHANNEL_CAPACITY: usize = 256;
/// Per-connection mailbox depth for per-user delivery.
pub const USER_CHANNEL_CAPACITY: usize = 64;
/// Backlog for the global broadcast channel.
pub const BROADCAST_CHANNEL_CAPACITY: usize = 256;

/// Identifies one live per-user connection so it can be unregistered again
/// without needing pointer equality on the channel it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// The messaging fabric contract. Delivery is best-effort and in-process
/// only: there is no persistence or at-least-once guarantee here, by
/// design — the durable record of truth is the bid history in C2.
pub trait EventBus: Send + Sync {
    /// Join `auction_id`'s room, returning a receiver that sees every event
    /// published to it from this call onward. Joining twice for the same
    /// auction just yields two independent receivers.
    fn join_room(&self, auction_id: AuctionId) -> broadcast::Receiver<Event>;

    /// Publish to every current subscriber of `auction_id`'s room. A no-op
    /// if nobody is subscribed.
    fn publish_room(&self, auction_id: AuctionId, event: Event);

    /// Register a new live connection for `user_id`. Events addressed to
    /// this user are delivered to the returned receiver until
    /// [`EventBus::unregister_user`] is called with the returned id.
    fn register_user(&self, user_id: UserId) -> (SubscriptionId, mpsc::Receiver<Event>);

    /// Drop one of `user_id`'s live connections. A no-op if the id is
    /// already gone (the connection already closed its own receiver).
    fn unregister_user(&self, user_id: UserId, subscription: SubscriptionId);

    /// Publish to every live connection currently registered for `user_id`.
    fn publish_user(&self, user_id: UserId, event: Event);

    /// Subscribe to the global broadcast channel (`LiveStatsUpdated` and
    /// any future service-wide event).
    fn subscribe_broadcast(&self) -> broadcast::Receiver<Event>;

    /// Publish to every broadcast subscriber.
    fn publish_broadcast(&self, event: Event);

    /// Advisory count of currently registered user connections, backing the
    /// `connected_users` field of `LiveStatsUpdated`. Not authoritative:
    /// connections can die without calling `unregister_user`.
    fn connected_user_count(&self) -> u64;
}
