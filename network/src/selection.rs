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

use crate::peer::PeerId;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Candidate peer pools the selector chooses from: previously-confirmed (`tried`) and
/// not-yet-confirmed (`new`).
pub struct ConnectionCandidates<'a> {
    pub tried: &'a [PeerId],
    pub new: &'a [PeerId],
}

/// Externally injected selection strategy for outbound connection targets, request routing, and
/// fan-out sends. Configuration wires in [`DefaultPeerSelector`]; embedding applications may
/// supply their own.
pub trait PeerSelector: Send + Sync {
    fn select_for_connection(&self, candidates: ConnectionCandidates<'_>, count: usize) -> Vec<PeerId>;
    fn select_for_request(&self, connected: &[PeerId]) -> Option<PeerId>;
    fn select_for_send(&self, connected: &[PeerId], limit: usize) -> Vec<PeerId>;
}

/// Default strategy from §4.4: connection selection is biased 80/20 toward tried peers; request
/// selection picks uniformly among connected peers; send selection picks `limit` peers uniformly.
pub struct DefaultPeerSelector {
    pub tried_bias: f64,
}

impl Default for DefaultPeerSelector {
    fn default() -> Self {
        Self { tried_bias: 0.8 }
    }
}

impl PeerSelector for DefaultPeerSelector {
    fn select_for_connection(&self, candidates: ConnectionCandidates<'_>, count: usize) -> Vec<PeerId> {
        let mut rng = thread_rng();
        let tried_count = ((count as f64) * self.tried_bias).round() as usize;
        let new_count = count.saturating_sub(tried_count);

        let mut tried: Vec<PeerId> = candidates.tried.to_vec();
        tried.shuffle(&mut rng);
        let mut new: Vec<PeerId> = candidates.new.to_vec();
        new.shuffle(&mut rng);

        let mut selected: Vec<PeerId> = tried.into_iter().take(tried_count).collect();
        selected.extend(new.into_iter().take(new_count));
        if selected.len() < count {
            // Backfill from whichever pool still has spare capacity.
            let mut backfill: Vec<PeerId> = candidates
                .tried
                .iter()
                .chain(candidates.new.iter())
                .filter(|p| !selected.contains(p))
                .cloned()
                .collect();
            backfill.shuffle(&mut rng);
            selected.extend(backfill.into_iter().take(count - selected.len()));
        }
        selected
    }

    fn select_for_request(&self, connected: &[PeerId]) -> Option<PeerId> {
        connected.choose(&mut thread_rng()).cloned()
    }

    fn select_for_send(&self, connected: &[PeerId], limit: usize) -> Vec<PeerId> {
        let mut pool: Vec<PeerId> = connected.to_vec();
        pool.shuffle(&mut thread_rng());
        pool.into_iter().take(limit).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(n: u8) -> PeerId {
        use std::net::{IpAddr, Ipv4Addr};
        PeerId::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)), 9000)
    }

    #[test]
    fn connection_selection_respects_count() {
        let tried: Vec<PeerId> = (0..10).map(id).collect();
        let new: Vec<PeerId> = (10..20).map(id).collect();
        let selector = DefaultPeerSelector::default();
        let selected = selector.select_for_connection(
            ConnectionCandidates {
                tried: &tried,
                new: &new,
            },
            5,
        );
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn send_selection_respects_limit() {
        let connected: Vec<PeerId> = (0..30).map(id).collect();
        let selector = DefaultPeerSelector::default();
        let selected = selector.select_for_send(&connected, 25);
        assert_eq!(selected.len(), 25);
    }
}
