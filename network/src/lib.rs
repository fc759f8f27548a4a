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

//! Bucketed peer address book, connection pool and P2P coordinator. Transport (the actual
//! WebSocket framing and wire codec) and cryptographic peer authentication are out of scope here;
//! this crate manages peer bookkeeping, connection admission and selection above that layer.

pub mod address_book;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod peer;
pub mod pool;
pub mod protection;
pub mod selection;
pub mod util;

pub use address_book::PeerAddressBook;
pub use config::{AddressBookConfig, PoolConfig, TableConfig};
pub use coordinator::{P2PCoordinator, StartupPeers};
pub use error::NetworkError;
pub use events::NetworkEvent;
pub use peer::{InternalState, PeerId, PeerInfo, PeerInfoPublic, PeerKind, SharedState};
pub use pool::PeerPool;
pub use selection::{ConnectionCandidates, DefaultPeerSelector, PeerSelector};
