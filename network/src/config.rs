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

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bucket shape for one of the address book's two tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TableConfig {
    pub num_buckets: usize,
    pub bucket_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookConfig {
    pub secret: [u8; 32],
    pub new_table: TableConfig,
    pub tried_table: TableConfig,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            secret: [0u8; 32],
            new_table: TableConfig {
                num_buckets: 128,
                bucket_size: 32,
            },
            tried_table: TableConfig {
                num_buckets: 64,
                bucket_size: 32,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_outbound_connections: usize,
    pub max_inbound_connections: usize,
    pub peer_ban_time: Duration,
    pub populator_interval: Duration,
    pub outbound_shuffle_interval: Duration,
    pub ws_max_payload: usize,
    pub ws_max_message_rate: u32,
    pub ws_max_message_rate_penalty: u32,
    pub rate_calculation_interval: Duration,
    pub netgroup_protection_ratio: f64,
    pub latency_protection_ratio: f64,
    pub productivity_protection_ratio: f64,
    pub longevity_protection_ratio: f64,
    pub send_peer_limit: usize,
    pub max_peer_discovery_response_length: usize,
    pub max_peer_info_size: usize,
    pub minimum_peer_discovery_threshold: usize,
    pub ack_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_outbound_connections: 20,
            max_inbound_connections: 100,
            peer_ban_time: Duration::from_secs(24 * 60 * 60),
            populator_interval: Duration::from_millis(10_000),
            outbound_shuffle_interval: Duration::from_millis(180_000),
            ws_max_payload: 1024 * 1024,
            ws_max_message_rate: 100,
            ws_max_message_rate_penalty: 10,
            rate_calculation_interval: Duration::from_millis(1_000),
            netgroup_protection_ratio: 0.1,
            latency_protection_ratio: 0.1,
            productivity_protection_ratio: 0.1,
            longevity_protection_ratio: 0.1,
            send_peer_limit: 25,
            max_peer_discovery_response_length: 1000,
            max_peer_info_size: 20 * 1024,
            minimum_peer_discovery_threshold: 100,
            ack_timeout: Duration::from_secs(10),
        }
    }
}
