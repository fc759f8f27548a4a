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

use crate::config::AddressBookConfig;
use crate::error::NetworkError;
use crate::peer::{PeerId, PeerInfo};
use crate::util::placement_index;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;

const LOG_TARGET: &str = "network::address_book";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    New,
    Tried,
}

struct Entry {
    info: PeerInfo,
    table: Table,
    bucket: usize,
    slot: usize,
    source_group: String,
    failure_count: u8,
}

/// Two bucketed tables (`new`, `tried`) with deterministic placement and an upgrade/downgrade
/// lifecycle. See the module-level FSM: `addPeer` places into `new`; `upgradePeer` promotes
/// `new -> tried` (or refreshes an already-`tried` peer); `downgradePeer` demotes on repeated
/// failure and eventually evicts.
pub struct PeerAddressBook {
    config: AddressBookConfig,
    entries: HashMap<PeerId, Entry>,
    new_buckets: Vec<Vec<Option<PeerId>>>,
    tried_buckets: Vec<Vec<Option<PeerId>>>,
}

impl PeerAddressBook {
    pub fn new(config: AddressBookConfig) -> Self {
        let new_buckets = vec![vec![None; config.new_table.bucket_size]; config.new_table.num_buckets];
        let tried_buckets = vec![vec![None; config.tried_table.bucket_size]; config.tried_table.num_buckets];
        Self {
            config,
            entries: HashMap::new(),
            new_buckets,
            tried_buckets,
        }
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.entries.contains_key(peer_id)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&PeerInfo> {
        self.entries.get(peer_id).map(|e| &e.info)
    }

    fn new_bucket_of(&self, source_group: &str, peer_group: &str) -> usize {
        placement_index(
            &self.config.secret,
            &[source_group, peer_group],
            self.config.new_table.num_buckets,
        )
    }

    fn tried_bucket_of(&self, peer_id: &PeerId) -> usize {
        placement_index(&self.config.secret, &[peer_id.as_str()], self.config.tried_table.num_buckets)
    }

    fn slot_of(&self, peer_id: &PeerId, bucket_size: usize) -> usize {
        placement_index(&self.config.secret, &[peer_id.as_str(), "slot"], bucket_size)
    }

    fn evict_slot(&mut self, table: Table, bucket: usize, slot: usize) -> Option<PeerId> {
        let buckets = match table {
            Table::New => &mut self.new_buckets,
            Table::Tried => &mut self.tried_buckets,
        };
        buckets[bucket][slot].take()
    }

    fn is_protected(&self, peer_id: &PeerId) -> bool {
        self.entries
            .get(peer_id)
            .map(|e| e.info.internal_state.kind.is_protected())
            .unwrap_or(false)
    }

    /// Places `peer_id` in `bucket`, preferring `preferred_slot`. If that slot is occupied by a
    /// non-protected peer, evicts it (dropping its entry). If occupied by a protected peer, falls
    /// back to the first free slot in the bucket, then to the first non-protected occupant
    /// anywhere in the bucket. Returns `false` (nothing written) only if every slot in the bucket
    /// holds a protected peer — the protection ratios in §4.4 leave no room.
    fn acquire_slot(&mut self, table: Table, bucket: usize, preferred_slot: usize, peer_id: &PeerId) -> Option<usize> {
        let bucket_size = match table {
            Table::New => self.new_buckets[bucket].len(),
            Table::Tried => self.tried_buckets[bucket].len(),
        };

        let occupant_at = |buckets: &[Vec<Option<PeerId>>]| buckets[bucket][preferred_slot].clone();
        let preferred_occupant = match table {
            Table::New => occupant_at(&self.new_buckets),
            Table::Tried => occupant_at(&self.tried_buckets),
        };

        let target_slot = match preferred_occupant {
            None => Some(preferred_slot),
            Some(occupant) if !self.is_protected(&occupant) => {
                self.evict_slot(table, bucket, preferred_slot);
                self.entries.remove(&occupant);
                Some(preferred_slot)
            },
            Some(_) => {
                let free_slot = (0..bucket_size).find(|&slot| {
                    let buckets = match table {
                        Table::New => &self.new_buckets,
                        Table::Tried => &self.tried_buckets,
                    };
                    buckets[bucket][slot].is_none()
                });
                free_slot.or_else(|| {
                    (0..bucket_size).find(|&slot| {
                        let occupant = match table {
                            Table::New => self.new_buckets[bucket][slot].clone(),
                            Table::Tried => self.tried_buckets[bucket][slot].clone(),
                        };
                        occupant.is_some_and(|o| !self.is_protected(&o))
                    })
                })
            },
        };

        let Some(slot) = target_slot else {
            warn!(target: LOG_TARGET, "bucket full of protected peers, refusing placement of {}", peer_id);
            return None;
        };

        if let Some(occupant) = match table {
            Table::New => self.new_buckets[bucket][slot].take(),
            Table::Tried => self.tried_buckets[bucket][slot].take(),
        } {
            self.entries.remove(&occupant);
        }
        match table {
            Table::New => self.new_buckets[bucket][slot] = Some(peer_id.clone()),
            Table::Tried => self.tried_buckets[bucket][slot] = Some(peer_id.clone()),
        }
        Some(slot)
    }

    /// Adds `peer` to the new table. Fails with `ExistingPeer` if already present in either
    /// table.
    pub fn add_peer(&mut self, peer: PeerInfo, source_group: String) -> Result<(), NetworkError> {
        if let Some(existing) = self.entries.get(&peer.peer_id) {
            return Err(NetworkError::ExistingPeer(
                peer.peer_id.clone(),
                Box::new(existing.info.clone()),
            ));
        }

        let peer_group = peer.peer_group();
        let bucket = self.new_bucket_of(&source_group, &peer_group);
        let preferred_slot = self.slot_of(&peer.peer_id, self.config.new_table.bucket_size);

        let Some(slot) = self.acquire_slot(Table::New, bucket, preferred_slot, &peer.peer_id) else {
            return Err(NetworkError::BucketFull(peer.peer_id.clone()));
        };

        self.entries.insert(
            peer.peer_id.clone(),
            Entry {
                info: peer,
                table: Table::New,
                bucket,
                slot,
                source_group,
                failure_count: 0,
            },
        );
        Ok(())
    }

    /// Promotes a peer from `new` to `tried` (or refreshes its failure counter if already
    /// `tried`).
    pub fn upgrade_peer(&mut self, peer_id: &PeerId) -> Result<(), NetworkError> {
        let Some(entry) = self.entries.get(peer_id) else {
            return Err(NetworkError::UnknownPeer(peer_id.clone()));
        };

        match entry.table {
            Table::Tried => {
                // Refresh: already confirmed reachable again, clear accumulated failures.
                self.entries.get_mut(peer_id).unwrap().failure_count = 0;
                Ok(())
            },
            Table::New => {
                let old_bucket = entry.bucket;
                let old_slot = entry.slot;
                let bucket = self.tried_bucket_of(peer_id);
                let preferred_slot = self.slot_of(peer_id, self.config.tried_table.bucket_size);

                let Some(slot) = self.acquire_slot(Table::Tried, bucket, preferred_slot, peer_id) else {
                    return Err(NetworkError::BucketFull(peer_id.clone()));
                };
                self.evict_slot(Table::New, old_bucket, old_slot);

                let entry = self.entries.get_mut(peer_id).unwrap();
                entry.table = Table::Tried;
                entry.bucket = bucket;
                entry.slot = slot;
                entry.failure_count = 0;
                debug!(target: LOG_TARGET, "upgraded {} to tried", peer_id);
                Ok(())
            },
        }
    }

    /// Increments the peer's failure counter, demoting tried -> new on the third failure and
    /// evicting a new-table peer immediately. Protected peers are exempt.
    pub fn downgrade_peer(&mut self, peer_id: &PeerId) -> Result<(), NetworkError> {
        let Some(entry) = self.entries.get(peer_id) else {
            return Err(NetworkError::UnknownPeer(peer_id.clone()));
        };
        if entry.info.internal_state.kind.is_protected() {
            return Ok(());
        }

        match entry.table {
            Table::New => {
                self.remove_peer(peer_id)?;
            },
            Table::Tried => {
                let entry = self.entries.get_mut(peer_id).unwrap();
                entry.failure_count += 1;
                if entry.failure_count >= 3 {
                    let source_group = entry.source_group.clone();
                    let peer_group = entry.info.peer_group();
                    let old_bucket = entry.bucket;
                    let old_slot = entry.slot;

                    let bucket = self.new_bucket_of(&source_group, &peer_group);
                    let preferred_slot = self.slot_of(peer_id, self.config.new_table.bucket_size);
                    let Some(slot) = self.acquire_slot(Table::New, bucket, preferred_slot, peer_id) else {
                        // Destination full of protected peers: leave the peer in tried with its
                        // failure counter pinned at the demotion threshold.
                        self.entries.get_mut(peer_id).unwrap().failure_count = 2;
                        return Ok(());
                    };
                    self.evict_slot(Table::Tried, old_bucket, old_slot);

                    let entry = self.entries.get_mut(peer_id).unwrap();
                    entry.table = Table::New;
                    entry.bucket = bucket;
                    entry.slot = slot;
                    entry.failure_count = 0;
                    debug!(target: LOG_TARGET, "demoted {} to new after repeated failures", peer_id);
                }
            },
        }
        Ok(())
    }

    /// Evicts `peer_id` from whichever table holds it.
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> Result<(), NetworkError> {
        let Some(entry) = self.entries.remove(peer_id) else {
            return Err(NetworkError::UnknownPeer(peer_id.clone()));
        };
        self.evict_slot(entry.table, entry.bucket, entry.slot);
        Ok(())
    }

    /// Evicts every non-protected peer registered under `ip`, across both ports and both tables.
    /// Protected peers (seed, fixed, whitelist) are left in place. Used to back `banPeer`'s
    /// "remove from book unless whitelisted" requirement.
    pub fn remove_peers_at_ip(&mut self, ip: &std::net::IpAddr) -> Vec<PeerId> {
        let matching: Vec<PeerId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.info.ip_address == *ip && !e.info.internal_state.kind.is_protected())
            .map(|(peer_id, _)| peer_id.clone())
            .collect();
        for peer_id in &matching {
            let _ = self.remove_peer(peer_id);
        }
        matching
    }

    /// Merges `shared_state` into the existing peer's record without changing table membership.
    pub fn update_peer(&mut self, peer_id: &PeerId, shared_state: crate::peer::SharedState) -> Result<(), NetworkError> {
        let entry = self.entries.get_mut(peer_id).ok_or_else(|| NetworkError::UnknownPeer(peer_id.clone()))?;
        entry.info.shared_state = shared_state;
        Ok(())
    }

    /// Returns between `min` and `max` peers chosen uniformly without replacement, filtering out
    /// any peer with `advertise_address == false`.
    pub fn get_randomized_peer_list(&self, min: usize, max: usize) -> Vec<PeerInfo> {
        let mut candidates: Vec<&PeerInfo> = self
            .entries
            .values()
            .map(|e| &e.info)
            .filter(|info| info.internal_state.advertise_address)
            .collect();
        candidates.shuffle(&mut thread_rng());
        let take = candidates.len().clamp(min.min(candidates.len()), max);
        candidates.into_iter().take(take).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peer::PeerKind;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer(last_octet: u8, port: u16, kind: PeerKind) -> PeerInfo {
        PeerInfo::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), port, kind, true)
    }

    #[test]
    fn s4_downgrade_cycle() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        let p = peer(1, 9000, PeerKind::Outbound);
        let id = p.peer_id.clone();
        book.add_peer(p, "src".to_string()).unwrap();
        book.upgrade_peer(&id).unwrap();
        assert!(book.contains(&id));

        book.downgrade_peer(&id).unwrap();
        book.downgrade_peer(&id).unwrap();
        book.downgrade_peer(&id).unwrap();
        assert!(book.contains(&id), "peer should be back in new table, not evicted");

        book.downgrade_peer(&id).unwrap();
        assert!(!book.contains(&id), "peer should now be evicted");
    }

    #[test]
    fn add_remove_add_is_idempotent() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        let p = peer(2, 9000, PeerKind::Outbound);
        let id = p.peer_id.clone();
        book.add_peer(p.clone(), "src".to_string()).unwrap();
        book.remove_peer(&id).unwrap();
        book.add_peer(p, "src".to_string()).unwrap();
        assert!(book.contains(&id));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn existing_peer_rejected() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        let p = peer(3, 9000, PeerKind::Outbound);
        book.add_peer(p.clone(), "src".to_string()).unwrap();
        assert!(matches!(
            book.add_peer(p, "src".to_string()),
            Err(NetworkError::ExistingPeer(_, _))
        ));
    }

    #[test]
    fn upgrade_is_idempotent() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        let p = peer(4, 9000, PeerKind::Outbound);
        let id = p.peer_id.clone();
        book.add_peer(p, "src".to_string()).unwrap();
        book.upgrade_peer(&id).unwrap();
        book.upgrade_peer(&id).unwrap();
        assert!(book.contains(&id));
    }

    #[test]
    fn remove_peers_at_ip_skips_protected_kinds() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        let ordinary = PeerInfo::new(ip, 9000, PeerKind::Outbound, true);
        let seeded = PeerInfo::new(ip, 9001, PeerKind::Seed, true);
        let ordinary_id = ordinary.peer_id.clone();
        let seeded_id = seeded.peer_id.clone();
        book.add_peer(ordinary, "src".to_string()).unwrap();
        book.add_peer(seeded, "src".to_string()).unwrap();

        let removed = book.remove_peers_at_ip(&ip);

        assert_eq!(removed, vec![ordinary_id.clone()]);
        assert!(!book.contains(&ordinary_id));
        assert!(book.contains(&seeded_id), "seed peers must never be removed by a ban");
    }

    #[test]
    fn peer_appears_in_at_most_one_table() {
        let mut book = PeerAddressBook::new(AddressBookConfig::default());
        for i in 0..20u8 {
            let p = peer(i, 9000, PeerKind::Outbound);
            book.add_peer(p, "src".to_string()).unwrap();
        }
        assert_eq!(book.len(), 20);
    }
}
