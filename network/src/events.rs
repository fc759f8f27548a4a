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

use crate::peer::{PeerId, PeerInfo};

/// Lifecycle and transport events emitted by the [`PeerPool`](crate::pool::PeerPool) and
/// [`P2PCoordinator`](crate::coordinator::P2PCoordinator). Socket-level failures surface here
/// rather than as `Result` errors, so the pool keeps operating through individual peer failures.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    NewInboundPeer(PeerId),
    OutboundConnect(PeerId),
    OutboundConnectAbort(PeerId),
    CloseInbound(PeerId),
    CloseOutbound(PeerId),
    RemovePeer(PeerId),
    BanPeer(PeerId),
    UnbanPeer(PeerId),
    DiscoveredPeer(PeerInfo),
    UpdatedPeerInfo(PeerId),
    MessageReceived(PeerId),
    RequestReceived(PeerId),
    NetworkReady,
    FailedPeerInfoUpdate(PeerId),
    FailedToFetchPeerInfo(PeerId),
    FailedToFetchPeers,
    FailedToPushNodeInfo(PeerId),
    FailedToSendMessage(PeerId),
    FailedToAddInboundPeer(PeerId),
    InboundSocketError(PeerId),
    OutboundSocketError(PeerId),
    FailedToCollectPeerDetailsOnConnect(PeerId),
}
