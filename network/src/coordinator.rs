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

use crate::config::{AddressBookConfig, PoolConfig};
use crate::error::NetworkError;
use crate::events::NetworkEvent;
use crate::peer::{PeerId, PeerInfo, PeerInfoPublic, PeerKind};
use crate::pool::PeerPool;
use crate::util::{estimate_peer_info_size, now_millis};
use crate::PeerAddressBook;
use log::{info, warn};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

const LOG_TARGET: &str = "network::coordinator";

/// Peers to seed the address book with on startup, grouped by the role they were configured
/// under.
#[derive(Debug, Clone, Default)]
pub struct StartupPeers {
    pub seeds: Vec<PeerInfo>,
    pub fixed: Vec<PeerInfo>,
    pub whitelist: Vec<PeerInfo>,
    pub previous: Vec<PeerInfo>,
}

/// Top-level P2P glue: owns the address book and connection pool, enforces bans, and answers
/// peer-discovery requests. Only one instance may be `start`ed per process; a second `start` call
/// fails with [`NetworkError::DuplicateInstance`].
pub struct P2PCoordinator {
    pool_config: PoolConfig,
    address_book: Arc<Mutex<PeerAddressBook>>,
    pool: Arc<PeerPool>,
    banned: Mutex<HashMap<IpAddr, u64>>,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl P2PCoordinator {
    pub fn new(address_book_config: AddressBookConfig, pool_config: PoolConfig) -> Self {
        let address_book = Arc::new(Mutex::new(PeerAddressBook::new(address_book_config)));
        let pool = Arc::new(PeerPool::new(pool_config.clone(), address_book.clone()));
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            pool_config,
            address_book,
            pool,
            banned: Mutex::new(HashMap::new()),
            started: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<NetworkEvent> {
        self.pool.subscribe()
    }

    /// Loads previously-known, whitelisted and fixed peers, upgrading each straight to `tried`
    /// since they were reachable in an earlier run (or are operator-trusted), then starts the
    /// pool's upkeep loop. Fails with [`NetworkError::DuplicateInstance`] if already running.
    pub async fn start(self: &Arc<Self>, startup: StartupPeers) -> Result<(), NetworkError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(NetworkError::DuplicateInstance);
        }

        {
            let mut book = self.address_book.lock().await;
            for peer in startup
                .seeds
                .into_iter()
                .chain(startup.fixed)
                .chain(startup.whitelist)
                .chain(startup.previous)
            {
                let peer_id = peer.peer_id.clone();
                let source_group = peer.peer_group();
                if book.add_peer(peer, source_group).is_ok() {
                    let _ = book.upgrade_peer(&peer_id);
                }
            }
            info!(target: LOG_TARGET, "loaded {} startup peer(s)", book.len());
        }

        let pool = self.pool.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(pool.run(shutdown_rx));
        Ok(())
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Bans `ip` for `self.pool_config.peer_ban_time` from now, measured from the coordinator's
    /// own clock, and evicts every non-whitelisted peer at that address from the address book so
    /// it stops being sampled by `get_peers_list`/the pool's connection selection.
    pub async fn ban_peer(&self, ip: IpAddr) {
        let until = now_millis() + self.pool_config.peer_ban_time.as_millis() as u64;
        self.banned.lock().await.insert(ip, until);

        let removed = self.address_book.lock().await.remove_peers_at_ip(&ip);
        for peer_id in &removed {
            self.pool.close(peer_id).await;
        }

        warn!(target: LOG_TARGET, "banned {} until epoch-ms {}, removed {} peer(s) from the book", ip, until, removed.len());
    }

    pub async fn unban_peer(&self, ip: IpAddr) {
        self.banned.lock().await.remove(&ip);
    }

    pub async fn is_banned(&self, ip: IpAddr) -> bool {
        let mut banned = self.banned.lock().await;
        match banned.get(&ip) {
            Some(&until) if until > now_millis() => true,
            Some(_) => {
                banned.remove(&ip);
                false
            },
            None => false,
        }
    }

    /// Validates an inbound connection attempt against the ban list before handing it to the
    /// pool's handshake logic.
    pub async fn accept_inbound(&self, peer: PeerInfo) -> Result<(), NetworkError> {
        if self.is_banned(peer.ip_address).await {
            return Err(NetworkError::PeerInboundHandshake {
                peer_id: peer.peer_id.clone(),
                reason: "peer is banned".to_string(),
            });
        }
        self.pool.handle_inbound_handshake(peer).await
    }

    /// Answers a `getPeersList` request: a uniform sample of known peers truncated so the
    /// serialized response stays within `max_peer_discovery_response_length` entries,
    /// `ws_max_payload` bytes, and the `ws_max_payload / max_peer_info_size - 1` entry-count
    /// ceiling that bounds the response regardless of how small each entry actually serializes.
    pub async fn get_peers_list(&self) -> Vec<PeerInfoPublic> {
        let book = self.address_book.lock().await;
        let candidates = book.get_randomized_peer_list(0, self.pool_config.max_peer_discovery_response_length);
        drop(book);

        let max_entries = (self.pool_config.ws_max_payload / self.pool_config.max_peer_info_size).saturating_sub(1);

        let mut response = Vec::with_capacity(candidates.len().min(max_entries));
        let mut payload_size = 0usize;
        for peer in candidates {
            if response.len() >= max_entries {
                break;
            }
            let public = PeerInfoPublic::from(&peer);
            let size = estimate_peer_info_size(&public);
            if size > self.pool_config.max_peer_info_size {
                continue;
            }
            if payload_size + size > self.pool_config.ws_max_payload {
                break;
            }
            payload_size += size;
            response.push(public);
        }
        response
    }

    /// Adds a peer discovered via `getPeersList` from a remote, respecting
    /// `minimum_peer_discovery_threshold`: discovery only runs while the address book is below
    /// that size.
    pub async fn should_discover_more_peers(&self) -> bool {
        self.address_book.lock().await.len() < self.pool_config.minimum_peer_discovery_threshold
    }

    pub async fn add_discovered_peer(&self, ip_address: IpAddr, ws_port: u16, source_group: String) -> Result<(), NetworkError> {
        let peer = PeerInfo::new(ip_address, ws_port, PeerKind::Inbound, true);
        self.address_book.lock().await.add_peer(peer, source_group)
    }

    pub async fn address_book_len(&self) -> usize {
        self.address_book.lock().await.len()
    }

    pub fn pool(&self) -> &Arc<PeerPool> {
        &self.pool
    }

    pub async fn connected_peer_ids(&self) -> Vec<PeerId> {
        self.pool.connected_peer_ids().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    fn coordinator() -> Arc<P2PCoordinator> {
        Arc::new(P2PCoordinator::new(AddressBookConfig::default(), PoolConfig::default()))
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let coordinator = self::coordinator();
        coordinator.start(StartupPeers::default()).await.unwrap();
        let err = coordinator.start(StartupPeers::default()).await.unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateInstance));
        coordinator.shutdown();
    }

    #[tokio::test]
    async fn ban_then_unban() {
        let coordinator = self::coordinator();
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));
        coordinator.ban_peer(ip).await;
        assert!(coordinator.is_banned(ip).await);
        coordinator.unban_peer(ip).await;
        assert!(!coordinator.is_banned(ip).await);
    }

    #[tokio::test]
    async fn startup_peers_are_promoted_to_tried() {
        let coordinator = self::coordinator();
        let seed = PeerInfo::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)), 9000, PeerKind::Seed, true);
        let startup = StartupPeers {
            seeds: vec![seed],
            ..StartupPeers::default()
        };
        coordinator.start(startup).await.unwrap();
        assert_eq!(coordinator.address_book_len().await, 1);
        coordinator.shutdown();
    }

    #[tokio::test]
    async fn banned_inbound_peer_is_rejected() {
        let coordinator = self::coordinator();
        let ip = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));
        coordinator.ban_peer(ip).await;
        let peer = PeerInfo::new(ip, 9000, PeerKind::Inbound, true);
        let err = coordinator.accept_inbound(peer).await.unwrap_err();
        assert!(matches!(err, NetworkError::PeerInboundHandshake { .. }));
    }

    #[tokio::test]
    async fn ban_peer_removes_non_whitelisted_entries_from_the_book() {
        let coordinator = self::coordinator();
        let ip = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 9));
        let outbound = PeerInfo::new(ip, 9000, PeerKind::Outbound, true);
        let whitelisted = PeerInfo::new(ip, 9001, PeerKind::Whitelist, true);
        let outbound_id = outbound.peer_id.clone();
        let whitelisted_id = whitelisted.peer_id.clone();
        {
            let mut book = coordinator.address_book.lock().await;
            book.add_peer(outbound, "src".to_string()).unwrap();
            book.add_peer(whitelisted, "src".to_string()).unwrap();
        }

        coordinator.ban_peer(ip).await;

        let book = coordinator.address_book.lock().await;
        assert!(!book.contains(&outbound_id), "banned peer must be removed from the book");
        assert!(book.contains(&whitelisted_id), "whitelisted peer must survive a ban");
    }

    #[tokio::test]
    async fn get_peers_list_caps_at_entry_count_ceiling() {
        // S5: 2000 peers, maxPeerInfoSize=10 KiB, wsMaxPayload=1 MiB -> at most 101 entries.
        let mut pool_config = PoolConfig::default();
        pool_config.max_peer_info_size = 10 * 1024;
        pool_config.ws_max_payload = 1024 * 1024;
        pool_config.max_peer_discovery_response_length = 1000;
        let coordinator = Arc::new(P2PCoordinator::new(AddressBookConfig::default(), pool_config));
        {
            let mut book = coordinator.address_book.lock().await;
            for i in 0..2000u32 {
                let ip = IpAddr::V4(Ipv4Addr::new(10, (i / 65536) as u8, ((i / 256) % 256) as u8, (i % 256) as u8));
                let peer = PeerInfo::new(ip, 9000, PeerKind::Outbound, true);
                let _ = book.add_peer(peer, format!("src-{i}"));
            }
        }

        let response = coordinator.get_peers_list().await;
        assert!(response.len() <= 101, "S5 bound violated: got {} entries", response.len());
    }
}
