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

use crate::peer::PeerInfoPublic;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Deterministic placement hash: `hash(secret || a || b) mod modulus`. Used for both bucket and
/// slot placement in the address book; a `DefaultHasher` keyed by the book's own secret is enough
/// to satisfy "deterministic from secret", without pulling in a cryptographic hash dependency that
/// belongs to the cryptographic-primitives collaborator this crate stays out of.
pub fn placement_hash(secret: &[u8; 32], parts: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    secret.hash(&mut hasher);
    for part in parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

pub fn placement_index(secret: &[u8; 32], parts: &[&str], modulus: usize) -> usize {
    if modulus == 0 {
        return 0;
    }
    (placement_hash(secret, parts) % modulus as u64) as usize
}

/// Rough estimate, in bytes, of a `PeerInfoPublic`'s serialized size. Used to cap the
/// peer-discovery response under `wsMaxPayload`.
pub fn estimate_peer_info_size(peer: &PeerInfoPublic) -> usize {
    serde_json::to_vec(peer).map(|bytes| bytes.len()).unwrap_or(256)
}

/// Current unix timestamp in milliseconds, used for connection-age and rate-window accounting.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Tracks a rolling count of events (e.g. WS messages) within the current accounting window.
/// Reset explicitly by the pool's rate-calculation tick rather than on a wall-clock timer, to
/// match the "independent timers contend for the same single thread" concurrency model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateCounter {
    count: u32,
}

impl RateCounter {
    pub fn record(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self) -> u32 {
        std::mem::take(&mut self.count)
    }

    pub fn current(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn placement_is_deterministic() {
        let secret = [7u8; 32];
        let a = placement_index(&secret, &["src", "dst"], 128);
        let b = placement_index(&secret, &["src", "dst"], 128);
        assert_eq!(a, b);
    }

    #[test]
    fn placement_varies_with_secret() {
        let a = placement_index(&[1u8; 32], &["x"], 128);
        let b = placement_index(&[2u8; 32], &["x"], 128);
        assert_ne!(a, b);
    }

    #[test]
    fn rate_counter_resets() {
        let mut counter = RateCounter::default();
        counter.record();
        counter.record();
        assert_eq!(counter.current(), 2);
        assert_eq!(counter.reset(), 2);
        assert_eq!(counter.current(), 0);
    }
}
