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

use crate::config::PoolConfig;
use crate::peer::PeerId;
use std::collections::HashSet;

/// Everything the protection-ratio eviction algorithm needs to know about one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionMeta {
    pub peer_id: PeerId,
    pub peer_group: String,
    pub rtt_millis: u64,
    pub useful_message_ratio: f64,
    pub connected_since_millis: u64,
    /// Seed, fixed and whitelist peers — unconditionally protected regardless of ratio.
    pub unconditionally_protected: bool,
}

/// Applies the four protections of §4.4 in order, each shielding the top fraction `r` of the
/// current set, and returns the complement: the eviction candidate set.
pub fn eviction_candidates(connections: &[ConnectionMeta], config: &PoolConfig) -> Vec<PeerId> {
    let n = connections.len();
    let mut protected: HashSet<PeerId> = connections
        .iter()
        .filter(|c| c.unconditionally_protected)
        .map(|c| c.peer_id.clone())
        .collect();

    protected.extend(protect_netgroup_diverse(connections, config.netgroup_protection_ratio * n as f64));
    protected.extend(protect_top_n(
        connections,
        (config.latency_protection_ratio * n as f64).floor() as usize,
        |c| -(c.rtt_millis as i64), // lower rtt is better
    ));
    protected.extend(protect_top_n(
        connections,
        (config.productivity_protection_ratio * n as f64).floor() as usize,
        |c| (c.useful_message_ratio * 1_000_000.0) as i64,
    ));
    protected.extend(protect_top_n(
        connections,
        (config.longevity_protection_ratio * n as f64).floor() as usize,
        |c| -(c.connected_since_millis as i64), // smaller timestamp = older = better
    ));

    connections
        .iter()
        .filter(|c| !protected.contains(&c.peer_id))
        .map(|c| c.peer_id.clone())
        .collect()
}

/// Protects up to `count` peers, preferring one per distinct netgroup before doubling up, so
/// netgroup diversity in the surviving set is maximised.
fn protect_netgroup_diverse(connections: &[ConnectionMeta], count: f64) -> HashSet<PeerId> {
    let count = count.floor() as usize;
    let mut protected = HashSet::new();
    let mut seen_groups: HashSet<&str> = HashSet::new();

    for conn in connections {
        if protected.len() >= count {
            break;
        }
        if seen_groups.insert(conn.peer_group.as_str()) {
            protected.insert(conn.peer_id.clone());
        }
    }
    for conn in connections {
        if protected.len() >= count {
            break;
        }
        protected.insert(conn.peer_id.clone());
    }
    protected
}

fn protect_top_n<F>(connections: &[ConnectionMeta], count: usize, score: F) -> HashSet<PeerId>
where
    F: Fn(&ConnectionMeta) -> i64,
{
    let mut ranked: Vec<&ConnectionMeta> = connections.iter().collect();
    ranked.sort_by_key(|c| std::cmp::Reverse(score(c)));
    ranked.into_iter().take(count).map(|c| c.peer_id.clone()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    /// Builds a connection with independent per-axis scores so the four protections below shield
    /// disjoint sets: every peer sits in its own netgroup (so netgroup-diversity protects array
    /// positions 0..10 outright), indices 10..20 have the lowest rtt, 20..30 the highest useful
    /// message ratio, and 30..40 the oldest `connected_since_millis`. Peers outside a protection's
    /// winning range all score worse than every peer inside it.
    fn conn(n: u8) -> ConnectionMeta {
        let rtt_millis = if (10..20).contains(&n) { n as u64 } else { 1000 + n as u64 };
        let useful_message_ratio = if (20..30).contains(&n) {
            0.9 + (29 - n) as f64 * 0.001
        } else {
            0.01
        };
        let connected_since_millis = if (30..40).contains(&n) { n as u64 } else { 100_000 + n as u64 };
        ConnectionMeta {
            peer_id: PeerId::new(IpAddr::V4(Ipv4Addr::new(10, 0, n, 1)), 9000),
            peer_group: format!("10.0.{}.0/16", n),
            rtt_millis,
            useful_message_ratio,
            connected_since_millis,
            unconditionally_protected: false,
        }
    }

    #[test]
    fn s6_protection_ratios() {
        let connections: Vec<ConnectionMeta> = (0..100u8).map(conn).collect();
        let config = PoolConfig {
            netgroup_protection_ratio: 0.1,
            latency_protection_ratio: 0.1,
            productivity_protection_ratio: 0.1,
            longevity_protection_ratio: 0.1,
            ..PoolConfig::default()
        };
        let candidates = eviction_candidates(&connections, &config);
        assert_eq!(candidates.len(), 60, "S6: 100 - (10+10+10+10) non-overlapping = 60");
    }

    #[test]
    fn unconditionally_protected_never_evicted() {
        let mut connections: Vec<ConnectionMeta> = (0..10u8).map(conn).collect();
        connections[0].unconditionally_protected = true;
        let config = PoolConfig::default();
        let candidates = eviction_candidates(&connections, &config);
        assert!(!candidates.contains(&connections[0].peer_id));
    }
}
