// Copyright 2019, The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::address_book::PeerAddressBook;
use crate::config::PoolConfig;
use crate::error::NetworkError;
use crate::events::NetworkEvent;
use crate::peer::{PeerId, PeerInfo, PeerKind};
use crate::protection::{eviction_candidates, ConnectionMeta};
use crate::selection::{ConnectionCandidates, DefaultPeerSelector, PeerSelector};
use crate::util::{now_millis, RateCounter};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{interval, MissedTickBehavior};

const LOG_TARGET: &str = "network::pool";

/// Bookkeeping kept per live connection, independent of the peer's address book entry.
struct Connection {
    peer_id: PeerId,
    kind: PeerKind,
    peer_group: String,
    connected_since_millis: u64,
    rtt_millis: u64,
    useful_messages: RateCounter,
    total_messages: RateCounter,
    /// Accumulated `wsMaxMessageRatePenalty` points from prior rate-window rollovers.
    rate_penalty: u32,
}

impl Connection {
    fn useful_message_ratio(&self) -> f64 {
        let total = self.total_messages.current();
        if total == 0 {
            1.0
        } else {
            self.useful_messages.current() as f64 / total as f64
        }
    }
}

/// Bounded set of inbound and outbound connections, multiplexed against the address book.
/// Mirrors the running-service shape of a block-event/liveness-event multiplexer: one `run` loop
/// reacting to connection events and periodic ticks via `tokio::select!`.
pub struct PeerPool {
    config: PoolConfig,
    address_book: Arc<Mutex<PeerAddressBook>>,
    inbound: Mutex<HashMap<PeerId, Connection>>,
    outbound: Mutex<HashMap<PeerId, Connection>>,
    selector: Arc<dyn PeerSelector>,
    event_publisher: broadcast::Sender<NetworkEvent>,
}

impl PeerPool {
    pub fn new(config: PoolConfig, address_book: Arc<Mutex<PeerAddressBook>>) -> Self {
        Self::with_selector(config, address_book, Arc::new(DefaultPeerSelector::default()))
    }

    pub fn with_selector(
        config: PoolConfig,
        address_book: Arc<Mutex<PeerAddressBook>>,
        selector: Arc<dyn PeerSelector>,
    ) -> Self {
        let (event_publisher, _) = broadcast::channel(256);
        Self {
            config,
            address_book,
            inbound: Mutex::new(HashMap::new()),
            outbound: Mutex::new(HashMap::new()),
            selector,
            event_publisher,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.event_publisher.subscribe()
    }

    fn publish(&self, event: NetworkEvent) {
        let _ = self.event_publisher.send(event);
    }

    /// Accepts an inbound connection after validating it isn't a duplicate and the peer isn't
    /// currently banned. Returns the address book entry that will back the connection's metadata.
    pub async fn handle_inbound_handshake(&self, peer: PeerInfo) -> Result<(), NetworkError> {
        let peer_id = peer.peer_id.clone();

        {
            let inbound = self.inbound.lock().await;
            if inbound.contains_key(&peer_id) {
                return Err(NetworkError::PeerInboundHandshake {
                    peer_id: peer_id.clone(),
                    reason: "duplicate connection".to_string(),
                });
            }
        }
        {
            let outbound = self.outbound.lock().await;
            if outbound.contains_key(&peer_id) {
                return Err(NetworkError::PeerInboundHandshake {
                    peer_id: peer_id.clone(),
                    reason: "duplicate connection".to_string(),
                });
            }
        }

        if self.inbound.lock().await.len() >= self.config.max_inbound_connections {
            self.evict_one(false).await;
        }

        let peer_group = peer.peer_group();
        let conn = Connection {
            peer_id: peer_id.clone(),
            kind: peer.internal_state.kind,
            peer_group,
            connected_since_millis: now_millis(),
            rtt_millis: 0,
            useful_messages: RateCounter::default(),
            total_messages: RateCounter::default(),
            rate_penalty: 0,
        };
        self.inbound.lock().await.insert(peer_id.clone(), conn);
        self.publish(NetworkEvent::NewInboundPeer(peer_id));
        Ok(())
    }

    /// Opens an outbound connection to `peer_id`, recording it against the pool's bound.
    pub async fn register_outbound(&self, peer: &PeerInfo, rtt_millis: u64) -> Result<(), NetworkError> {
        if self.outbound.lock().await.len() >= self.config.max_outbound_connections {
            self.evict_one(true).await;
        }
        let conn = Connection {
            peer_id: peer.peer_id.clone(),
            kind: peer.internal_state.kind,
            peer_group: peer.peer_group(),
            connected_since_millis: now_millis(),
            rtt_millis,
            useful_messages: RateCounter::default(),
            total_messages: RateCounter::default(),
            rate_penalty: 0,
        };
        self.outbound.lock().await.insert(peer.peer_id.clone(), conn);
        self.publish(NetworkEvent::OutboundConnect(peer.peer_id.clone()));
        Ok(())
    }

    pub async fn record_message(&self, peer_id: &PeerId, useful: bool, outbound: bool) {
        let mut set = if outbound {
            self.outbound.lock().await
        } else {
            self.inbound.lock().await
        };
        if let Some(conn) = set.get_mut(peer_id) {
            conn.total_messages.record();
            if useful {
                conn.useful_messages.record();
            }
        }
    }

    async fn connection_metas(set: &HashMap<PeerId, Connection>) -> Vec<ConnectionMeta> {
        set.values()
            .map(|c| ConnectionMeta {
                peer_id: c.peer_id.clone(),
                peer_group: c.peer_group.clone(),
                rtt_millis: c.rtt_millis,
                useful_message_ratio: c.useful_message_ratio(),
                connected_since_millis: c.connected_since_millis,
                unconditionally_protected: c.kind.is_protected(),
            })
            .collect()
    }

    /// Evicts one connection from the requested set using the protection-ratio algorithm,
    /// preferring the most recently connected among the eviction candidates.
    async fn evict_one(&self, outbound: bool) {
        let mut set = if outbound {
            self.outbound.lock().await
        } else {
            self.inbound.lock().await
        };
        let metas = Self::connection_metas(&set).await;
        let candidates = eviction_candidates(&metas, &self.config);
        let Some(victim) = candidates
            .iter()
            .filter_map(|id| set.get(id).map(|c| (id.clone(), c.connected_since_millis)))
            .max_by_key(|(_, connected_since)| *connected_since)
            .map(|(id, _)| id)
        else {
            warn!(target: LOG_TARGET, "no eviction candidate available, pool at capacity");
            return;
        };
        set.remove(&victim);
        let event = if outbound {
            NetworkEvent::CloseOutbound(victim)
        } else {
            NetworkEvent::CloseInbound(victim)
        };
        debug!(target: LOG_TARGET, "evicted connection to make room: {:?}", event);
        self.publish(event);
    }

    pub async fn close(&self, peer_id: &PeerId) {
        if self.inbound.lock().await.remove(peer_id).is_some() {
            self.publish(NetworkEvent::CloseInbound(peer_id.clone()));
        }
        if self.outbound.lock().await.remove(peer_id).is_some() {
            self.publish(NetworkEvent::CloseOutbound(peer_id.clone()));
        }
    }

    pub async fn connected_peer_ids(&self) -> Vec<PeerId> {
        let inbound = self.inbound.lock().await;
        let outbound = self.outbound.lock().await;
        inbound.keys().chain(outbound.keys()).cloned().collect()
    }

    /// Selects `count` outbound targets from the address book, biased per the selector.
    pub async fn select_connection_targets(&self, count: usize) -> Vec<PeerId> {
        let book = self.address_book.lock().await;
        // The address book doesn't expose its tried/new split directly; a randomized sample
        // across both stands in as the connection candidate pool here.
        let peers = book.get_randomized_peer_list(count, count.max(1) * 2);
        let ids: Vec<PeerId> = peers.iter().map(|p| p.peer_id.clone()).collect();
        self.selector
            .select_for_connection(ConnectionCandidates { tried: &ids, new: &[] }, count)
    }

    pub async fn select_request_target(&self) -> Option<PeerId> {
        let connected = self.connected_peer_ids().await;
        self.selector.select_for_request(&connected)
    }

    pub async fn select_send_targets(&self) -> Vec<PeerId> {
        let connected = self.connected_peer_ids().await;
        self.selector.select_for_send(&connected, self.config.send_peer_limit)
    }

    /// Periodic upkeep: tops up outbound connections, shuffles stale ones out, and rolls over
    /// the per-connection message-rate windows. Runs until the returned shutdown sender is
    /// dropped or signalled.
    pub async fn run(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut populator = interval(self.config.populator_interval);
        populator.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shuffle = interval(self.config.outbound_shuffle_interval);
        shuffle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rate_tick = interval(self.config.rate_calculation_interval);
        rate_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(target: LOG_TARGET, "peer pool upkeep loop starting");
        loop {
            tokio::select! {
                _ = populator.tick() => {
                    self.populate_outbound().await;
                },
                _ = shuffle.tick() => {
                    self.shuffle_outbound().await;
                },
                _ = rate_tick.tick() => {
                    self.roll_rate_windows().await;
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(target: LOG_TARGET, "peer pool upkeep loop shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn populate_outbound(&self) {
        let current = self.outbound.lock().await.len();
        if current >= self.config.max_outbound_connections {
            return;
        }
        let needed = self.config.max_outbound_connections - current;
        let targets = self.select_connection_targets(needed).await;
        debug!(target: LOG_TARGET, "populator selected {} outbound target(s)", targets.len());
        for peer_id in targets {
            self.publish(NetworkEvent::OutboundConnect(peer_id));
        }
    }

    async fn shuffle_outbound(&self) {
        let should_shuffle = {
            let outbound = self.outbound.lock().await;
            outbound.len() >= self.config.max_outbound_connections
        };
        if should_shuffle {
            self.evict_one(true).await;
        }
    }

    /// Rolls over the per-connection message-rate windows and accumulates §4.4's
    /// `wsMaxMessageRatePenalty` against any peer that exceeded `wsMaxMessageRate` in the
    /// window just ended. A peer whose accumulated penalty reaches 100 is closed and its ban
    /// is announced via [`NetworkEvent::BanPeer`] for the coordinator to act on.
    async fn roll_rate_windows(&self) {
        let mut to_ban = Vec::new();
        for set in [&self.inbound, &self.outbound] {
            let mut set = set.lock().await;
            for conn in set.values_mut() {
                let rate = conn.total_messages.reset();
                conn.useful_messages.reset();
                if rate > self.config.ws_max_message_rate {
                    conn.rate_penalty = conn.rate_penalty.saturating_add(self.config.ws_max_message_rate_penalty);
                    warn!(
                        target: LOG_TARGET,
                        "peer {} exceeded message rate ({} > {}), penalty now {}",
                        conn.peer_id,
                        rate,
                        self.config.ws_max_message_rate,
                        conn.rate_penalty
                    );
                    if conn.rate_penalty >= 100 {
                        to_ban.push(conn.peer_id.clone());
                    }
                }
            }
        }
        for peer_id in to_ban {
            self.close(&peer_id).await;
            self.publish(NetworkEvent::BanPeer(peer_id));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::AddressBookConfig;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer(last_octet: u8, kind: PeerKind) -> PeerInfo {
        PeerInfo::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), 9000, kind, true)
    }

    fn pool() -> PeerPool {
        PeerPool::new(
            PoolConfig::default(),
            Arc::new(Mutex::new(PeerAddressBook::new(AddressBookConfig::default()))),
        )
    }

    #[tokio::test]
    async fn inbound_handshake_rejects_duplicate() {
        let pool = pool();
        let p = peer(1, PeerKind::Inbound);
        pool.handle_inbound_handshake(p.clone()).await.unwrap();
        let err = pool.handle_inbound_handshake(p).await.unwrap_err();
        assert!(matches!(err, NetworkError::PeerInboundHandshake { .. }));
    }

    #[tokio::test]
    async fn close_removes_from_both_sets() {
        let pool = pool();
        let p = peer(2, PeerKind::Inbound);
        let id = p.peer_id.clone();
        pool.handle_inbound_handshake(p).await.unwrap();
        pool.close(&id).await;
        assert!(pool.connected_peer_ids().await.is_empty());
    }

    #[tokio::test]
    async fn exceeding_message_rate_accumulates_penalty_and_bans_at_100() {
        let mut config = PoolConfig::default();
        config.ws_max_message_rate = 5;
        config.ws_max_message_rate_penalty = 40;
        let pool = PeerPool::new(
            config,
            Arc::new(Mutex::new(PeerAddressBook::new(AddressBookConfig::default()))),
        );
        let p = peer(1, PeerKind::Inbound);
        let id = p.peer_id.clone();
        pool.handle_inbound_handshake(p).await.unwrap();

        let mut events = pool.subscribe();

        // 3 windows over the rate limit accumulate 120 >= 100 penalty points and trigger a ban.
        for _ in 0..3 {
            for _ in 0..10 {
                pool.record_message(&id, true, false).await;
            }
            pool.roll_rate_windows().await;
        }

        assert!(pool.connected_peer_ids().await.is_empty(), "offending peer must be closed");

        let mut banned = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, NetworkEvent::BanPeer(ref banned_id) if *banned_id == id) {
                banned = true;
            }
        }
        assert!(banned, "a BanPeer event must be emitted once penalty reaches 100");
    }

    #[tokio::test]
    async fn outbound_eviction_makes_room() {
        let mut config = PoolConfig::default();
        config.max_outbound_connections = 2;
        let pool = PeerPool::new(
            config,
            Arc::new(Mutex::new(PeerAddressBook::new(AddressBookConfig::default()))),
        );
        for i in 0..3u8 {
            let p = peer(i, PeerKind::Outbound);
            pool.register_outbound(&p, 10).await.unwrap();
        }
        assert!(pool.outbound.lock().await.len() <= 2);
    }
}
