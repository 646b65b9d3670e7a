//! The production [`EventBus`]: a `DashMap`-backed hub fanning out to
//! `tokio` broadcast/mpsc channels, generalized from the teacher's
//! `Arc<RwLock<HashMap<..>>>` per-chain registries into per-auction rooms
//! and a per-user connection registry.

use crate::{EventBus, SubscriptionId, BROADCAST_CHANNEL_CAPACITY, ROOM_CHANNEL_CAPACITY, USER_CHANNEL_CAPACITY};
use auction_domain::{ids::room_key, AuctionId, Event, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc};

/// In-process hub. Holding the returned receivers alive is the caller's
/// job; a room's `broadcast::Sender` is kept around even with zero
/// subscribers so a publish arriving just before a join is never lost to a
/// torn-down channel (it is still lost if the join happens after the
/// publish — delivery here is strictly best-effort, never replayed).
pub struct EventHub {
    rooms: DashMap<String, broadcast::Sender<Event>>,
    users: DashMap<UserId, Vec<(SubscriptionId, mpsc::Sender<Event>)>>,
    global: broadcast::Sender<Event>,
    connected_users: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        let (global, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);
        Self {
            rooms: DashMap::new(),
            users: DashMap::new(),
            global,
            connected_users: AtomicU64::new(0),
        }
    }

    fn room_sender(&self, auction_id: AuctionId) -> broadcast::Sender<Event> {
        self.rooms
            .entry(room_key(auction_id))
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for EventHub {
    fn join_room(&self, auction_id: AuctionId) -> broadcast::Receiver<Event> {
        self.room_sender(auction_id).subscribe()
    }

    fn publish_room(&self, auction_id: AuctionId, event: Event) {
        let sender = self.room_sender(auction_id);
        // Err(SendError) only means nobody is currently subscribed.
        let _ = sender.send(event);
    }

    fn register_user(&self, user_id: UserId) -> (SubscriptionId, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(USER_CHANNEL_CAPACITY);
        let subscription = SubscriptionId::new();
        self.users.entry(user_id).or_default().push((subscription, tx));
        self.connected_users.fetch_add(1, Ordering::Relaxed);
        (subscription, rx)
    }

    fn unregister_user(&self, user_id: UserId, subscription: SubscriptionId) {
        if let Some(mut entry) = self.users.get_mut(&user_id) {
            let before = entry.len();
            entry.retain(|(id, _)| *id != subscription);
            if entry.len() != before {
                self.connected_users.fetch_sub(1, Ordering::Relaxed);
            }
            let now_empty = entry.is_empty();
            drop(entry);
            if now_empty {
                self.users.remove(&user_id);
            }
        }
    }

    fn publish_user(&self, user_id: UserId, event: Event) {
        let Some(entry) = self.users.get(&user_id) else {
            return;
        };
        for (_, sender) in entry.iter() {
            if let Err(err) = sender.try_send(event.clone()) {
                tracing::warn!(%user_id, "dropped event for user connection: {err}");
            }
        }
    }

    fn subscribe_broadcast(&self) -> broadcast::Receiver<Event> {
        self.global.subscribe()
    }

    fn publish_broadcast(&self, event: Event) {
        let _ = self.global.send(event);
    }

    fn connected_user_count(&self) -> u64 {
        self.connected_users.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_domain::events::{NewBidEvent, OutbidEvent};
    use auction_domain::{Bid, Clock, SystemClock};
    use rust_decimal_macros::dec;

    fn sample_bid(auction_id: AuctionId) -> Bid {
        let clock = SystemClock::new();
        Bid::new_winning(auction_id, UserId::new(), dec!(10.00), clock.now(), None)
    }

    #[tokio::test]
    async fn room_publish_reaches_subscriber() {
        let hub = EventHub::new();
        let auction_id = AuctionId::new();
        let mut rx = hub.join_room(auction_id);

        let bid = sample_bid(auction_id);
        hub.publish_room(
            auction_id,
            Event::NewBid(NewBidEvent {
                auction_id,
                bid: bid.clone(),
                new_current_price: bid.amount,
                total_bids: 1,
                time_remaining_secs: 60,
            }),
        );

        let received = rx.recv().await.unwrap();
        match received {
            Event::NewBid(e) => assert_eq!(e.bid.id, bid.id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_room_with_no_subscribers_is_not_an_error() {
        let hub = EventHub::new();
        hub.publish_room(
            AuctionId::new(),
            Event::LiveStatsUpdated(auction_domain::events::LiveStatsUpdatedEvent {
                active_auctions: 0,
                connected_users: 0,
                timestamp: SystemClock::new().now(),
            }),
        );
    }

    #[tokio::test]
    async fn user_registration_tracks_connected_count() {
        let hub = EventHub::new();
        let user_id = UserId::new();
        assert_eq!(hub.connected_user_count(), 0);

        let (sub_a, mut rx_a) = hub.register_user(user_id);
        let (sub_b, _rx_b) = hub.register_user(user_id);
        assert_eq!(hub.connected_user_count(), 2);

        hub.publish_user(
            user_id,
            Event::Outbid(OutbidEvent {
                auction_id: AuctionId::new(),
                auction_title: "Vintage camera".into(),
                your_bid: dec!(10.00),
                new_highest_bid: dec!(15.00),
                minimum_next_bid: dec!(20.00),
            }),
        );
        assert!(rx_a.recv().await.is_some());

        hub.unregister_user(user_id, sub_a);
        hub.unregister_user(user_id, sub_b);
        assert_eq!(hub.connected_user_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let hub = EventHub::new();
        let mut a = hub.subscribe_broadcast();
        let mut b = hub.subscribe_broadcast();

        hub.publish_broadcast(Event::LiveStatsUpdated(
            auction_domain::events::LiveStatsUpdatedEvent {
                active_auctions: 3,
                connected_users: 7,
                timestamp: SystemClock::new().now(),
            },
        ));

        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }
}
