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

use crate::config::ApplicationConfig;
use affinity_common::{ExitCode, ExitError};
use affinity_finality::{FinalityManager, InMemoryFinalizedHeightStore};
use affinity_network::{P2PCoordinator, StartupPeers};
use std::sync::Arc;

/// Handles to the two running cores, held for the lifetime of the process.
pub struct NodeContext {
    pub finality: Arc<FinalityManager<InMemoryFinalizedHeightStore>>,
    pub network: Arc<P2PCoordinator>,
}

impl NodeContext {
    /// Stops the network coordinator's background service loop. The finality core holds no
    /// background task and needs no explicit shutdown.
    pub fn shutdown(&self) {
        self.network.shutdown();
    }
}

/// Builds the finality core and the P2P coordinator from a resolved configuration and starts the
/// coordinator's background service loop. The finality core has no loop of its own; it is driven
/// synchronously by whoever decodes headers off the wire.
pub async fn bootstrap(config: &ApplicationConfig) -> Result<NodeContext, ExitError> {
    let finality = Arc::new(FinalityManager::new_in_memory(config.active_delegates, config.finalized_height));

    let network = Arc::new(P2PCoordinator::new(config.address_book_config(), config.pool_config()));
    network
        .start(StartupPeers::default())
        .await
        .map_err(|err| ExitError::new(ExitCode::NetworkError, err))?;

    Ok(NodeContext { finality, network })
}
