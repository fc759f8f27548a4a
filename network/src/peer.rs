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

use cidr::Ipv4Cidr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Canonical `ipAddress:wsPort` string form. Uniquely identifies a peer across both address book
/// tables; a peer id appears in at most one table at a time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(ip_address: IpAddr, ws_port: u16) -> Self {
        Self(format!("{}:{}", ip_address, ws_port))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a peer was added under. Seed, fixed and whitelist peers are exempt from
/// downgrade-triggered removal and unconditionally protected from eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerKind {
    Seed,
    Fixed,
    Whitelist,
    Previous,
    Inbound,
    Outbound,
}

impl PeerKind {
    pub fn is_protected(self) -> bool {
        matches!(self, PeerKind::Seed | PeerKind::Fixed | PeerKind::Whitelist)
    }
}

/// Externally visible attributes a peer advertises about itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    pub version: String,
    pub height: u64,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Internal bookkeeping not advertised to other peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalState {
    pub kind: PeerKind,
    pub advertise_address: bool,
    pub connection_attempts: u32,
}

impl InternalState {
    pub fn new(kind: PeerKind, advertise_address: bool) -> Self {
        Self {
            kind,
            advertise_address,
            connection_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub ip_address: IpAddr,
    pub ws_port: u16,
    pub shared_state: SharedState,
    pub internal_state: InternalState,
}

impl PeerInfo {
    pub fn new(ip_address: IpAddr, ws_port: u16, kind: PeerKind, advertise_address: bool) -> Self {
        Self {
            peer_id: PeerId::new(ip_address, ws_port),
            ip_address,
            ws_port,
            shared_state: SharedState::default(),
            internal_state: InternalState::new(kind, advertise_address),
        }
    }

    /// /16 IPv4 prefix (or the full address for IPv6) used for netgroup diversity.
    pub fn peer_group(&self) -> String {
        peer_group_of(&self.ip_address)
    }
}

/// Publicly shareable view of a [`PeerInfo`], returned from the peer-discovery RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfoPublic {
    pub ip_address: IpAddr,
    pub ws_port: u16,
    pub shared_state: SharedState,
}

impl From<&PeerInfo> for PeerInfoPublic {
    fn from(info: &PeerInfo) -> Self {
        Self {
            ip_address: info.ip_address,
            ws_port: info.ws_port,
            shared_state: info.shared_state.clone(),
        }
    }
}

/// Group peers by /16 IPv4 prefix; IPv6 addresses are grouped by their full address since there's
/// no single widely-agreed IPv6 netgroup convention to lean on.
pub fn peer_group_of(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let net = Ipv4Cidr::new(*v4, 16).expect("16 is a valid IPv4 prefix length");
            format!("{}/16", net.first_address())
        },
        IpAddr::V6(v6) => v6.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn peer_id_is_canonical() {
        let id = PeerId::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        assert_eq!(id.as_str(), "127.0.0.1:8080");
    }

    #[test]
    fn peer_group_uses_slash_16() {
        let group = peer_group_of(&IpAddr::V4(Ipv4Addr::new(203, 0, 113, 42)));
        assert_eq!(group, "203.0.0.0/16");
    }
}
