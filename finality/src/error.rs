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

use thiserror::Error;

/// Errors raised while validating and accounting block headers against the BFT finality rules.
#[derive(Debug, Error)]
pub enum FinalityError {
    #[error("Header failed schema validation: {0}")]
    InvalidHeaderSchema(String),
    #[error("Fork choice violation: delegate {delegate} double-forged at height {height}")]
    ForkChoiceViolation { delegate: String, height: u64 },
    #[error("Chain disjoint: delegate's earlier header at height {earlier_height} is not reachable from later header's maxHeightPreviouslyForged {later_forged}")]
    ChainDisjoint { earlier_height: u64, later_forged: u64 },
    #[error("Lower chain branch: earlier header prevoted higher ({earlier_prevoted}) than later header ({later_prevoted})")]
    LowerChainBranch { earlier_prevoted: u64, later_prevoted: u64 },
    #[error("Invalid attribute: header maxHeightPrevoted {header} does not match local chainMaxHeightPrevoted {local}")]
    InvalidAttribute { header: u64, local: u64 },
    #[error("Required argument missing: {0}")]
    ArgumentMissing(&'static str),
    #[error("Finalized height store error: {0}")]
    Store(String),
}
