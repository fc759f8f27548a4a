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

use crate::error::FinalityError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Persistence seam for `finalizedHeight`, which must survive restarts even though this crate has
/// no storage engine of its own. The block-processor collaborator supplies a concrete
/// implementation backed by its chain-state database; tests and standalone runs use
/// [`InMemoryFinalizedHeightStore`].
pub trait FinalizedHeightStore: Send + Sync {
    fn load_finalized_height(&self) -> Result<u64, FinalityError>;
    fn persist_finalized_height(&self, height: u64) -> Result<(), FinalityError>;
}

/// An in-process, non-persistent store. Used by default and in tests; a node wired to real
/// storage replaces this with its own `FinalizedHeightStore` implementation.
#[derive(Debug, Default)]
pub struct InMemoryFinalizedHeightStore {
    height: AtomicU64,
}

impl InMemoryFinalizedHeightStore {
    pub fn new(initial: u64) -> Self {
        Self {
            height: AtomicU64::new(initial),
        }
    }
}

impl FinalizedHeightStore for InMemoryFinalizedHeightStore {
    fn load_finalized_height(&self) -> Result<u64, FinalityError> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    fn persist_finalized_height(&self, height: u64) -> Result<(), FinalityError> {
        self.height.store(height, Ordering::SeqCst);
        Ok(())
    }
}
