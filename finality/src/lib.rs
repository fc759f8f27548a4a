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

//! The BFT finality core: per-delegate pre-vote/pre-commit accounting over a bounded window of
//! block headers, plus the pure fork-choice classifier that sits in front of it.
//!
//! This crate has no notion of block serialization, persistent storage, transaction application
//! or wire transport; those are external collaborators. It consumes [`header::BlockHeader`]
//! values already schema-decoded, and exposes a [`storage::FinalizedHeightStore`] seam so the
//! single piece of state that must survive restarts — `finalizedHeight` — can be wired to real
//! storage by whoever embeds this crate.

pub mod delegate_state;
pub mod error;
pub mod fork_choice;
pub mod header;
pub mod manager;
pub mod storage;

pub use error::FinalityError;
pub use fork_choice::{classify as fork_choice, ForkChoiceOutcome};
pub use header::{BlockHeader, DelegatePublicKey, HeaderList};
pub use manager::{FinalityChangedCallback, FinalityManager, HeaderWindowShrinkCallback};
pub use storage::{FinalizedHeightStore, InMemoryFinalizedHeightStore};
