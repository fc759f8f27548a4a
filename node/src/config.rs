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

use affinity_network::{AddressBookConfig, PoolConfig, TableConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Every setting enumerated for a running node: delegate set size, the finality starting point,
/// the address book's placement secret, and the full `PoolConfig` surface (connection limits,
/// timers, protection ratios, discovery caps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub active_delegates: u64,
    pub finalized_height: u64,
    pub secret: [u8; 32],

    pub new_table: TableConfig,
    pub tried_table: TableConfig,

    pub max_outbound_connections: usize,
    pub max_inbound_connections: usize,
    #[serde(with = "affinity_common::serializers::seconds")]
    pub peer_ban_time: Duration,
    #[serde(with = "affinity_common::serializers::millis")]
    pub populator_interval: Duration,
    #[serde(with = "affinity_common::serializers::millis")]
    pub outbound_shuffle_interval: Duration,
    pub ws_max_payload: usize,
    pub ws_max_message_rate: u32,
    pub ws_max_message_rate_penalty: u32,
    #[serde(with = "affinity_common::serializers::millis")]
    pub rate_calculation_interval: Duration,
    pub netgroup_protection_ratio: f64,
    pub latency_protection_ratio: f64,
    pub productivity_protection_ratio: f64,
    pub longevity_protection_ratio: f64,
    pub send_peer_limit: usize,
    pub max_peer_discovery_response_length: usize,
    pub max_peer_info_size: usize,
    pub minimum_peer_discovery_threshold: usize,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        let address_book = AddressBookConfig::default();
        Self {
            active_delegates: 101,
            finalized_height: 0,
            secret: address_book.secret,
            new_table: address_book.new_table,
            tried_table: address_book.tried_table,
            max_outbound_connections: pool.max_outbound_connections,
            max_inbound_connections: pool.max_inbound_connections,
            peer_ban_time: pool.peer_ban_time,
            populator_interval: pool.populator_interval,
            outbound_shuffle_interval: pool.outbound_shuffle_interval,
            ws_max_payload: pool.ws_max_payload,
            ws_max_message_rate: pool.ws_max_message_rate,
            ws_max_message_rate_penalty: pool.ws_max_message_rate_penalty,
            rate_calculation_interval: pool.rate_calculation_interval,
            netgroup_protection_ratio: pool.netgroup_protection_ratio,
            latency_protection_ratio: pool.latency_protection_ratio,
            productivity_protection_ratio: pool.productivity_protection_ratio,
            longevity_protection_ratio: pool.longevity_protection_ratio,
            send_peer_limit: pool.send_peer_limit,
            max_peer_discovery_response_length: pool.max_peer_discovery_response_length,
            max_peer_info_size: pool.max_peer_info_size,
            minimum_peer_discovery_threshold: pool.minimum_peer_discovery_threshold,
        }
    }
}

impl ApplicationConfig {
    pub fn address_book_config(&self) -> AddressBookConfig {
        AddressBookConfig {
            secret: self.secret,
            new_table: self.new_table,
            tried_table: self.tried_table,
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_outbound_connections: self.max_outbound_connections,
            max_inbound_connections: self.max_inbound_connections,
            peer_ban_time: self.peer_ban_time,
            populator_interval: self.populator_interval,
            outbound_shuffle_interval: self.outbound_shuffle_interval,
            ws_max_payload: self.ws_max_payload,
            ws_max_message_rate: self.ws_max_message_rate,
            ws_max_message_rate_penalty: self.ws_max_message_rate_penalty,
            rate_calculation_interval: self.rate_calculation_interval,
            netgroup_protection_ratio: self.netgroup_protection_ratio,
            latency_protection_ratio: self.latency_protection_ratio,
            productivity_protection_ratio: self.productivity_protection_ratio,
            longevity_protection_ratio: self.longevity_protection_ratio,
            send_peer_limit: self.send_peer_limit,
            max_peer_discovery_response_length: self.max_peer_discovery_response_length,
            max_peer_info_size: self.max_peer_info_size,
            minimum_peer_discovery_threshold: self.minimum_peer_discovery_threshold,
            ack_timeout: PoolConfig::default().ack_timeout,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pool_config_round_trips_defaults() {
        let app = ApplicationConfig::default();
        let pool = app.pool_config();
        assert_eq!(pool.max_outbound_connections, 20);
        assert_eq!(pool.max_inbound_connections, 100);
    }
}
