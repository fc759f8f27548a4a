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

use crate::delegate_state::{DelegateStateMap, VoteTallies};
use crate::error::FinalityError;
use crate::header::{BlockHeader, HeaderList};
use crate::storage::{FinalizedHeightStore, InMemoryFinalizedHeightStore};
use log::{debug, trace, warn};
use std::sync::Arc;

const LOG_TARGET: &str = "finality::manager";

/// Delivered synchronously, before the mutating call returns, whenever `finalizedHeight`
/// advances.
pub type FinalityChangedCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Delivered when `recompute` leaves the header window below two rounds (`2 * active_delegates`
/// headers); the caller may refill the list from storage in response.
pub type HeaderWindowShrinkCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Derived constants for a given number of active delegates `D`.
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    pre_vote: u64,
    pre_commit: u64,
    processing: u64,
    max_headers: u64,
}

impl Thresholds {
    fn new(active_delegates: u64) -> Self {
        let two_thirds = (2 * active_delegates + 2) / 3; // ceil(2D/3)
        Self {
            pre_vote: two_thirds,
            pre_commit: two_thirds,
            processing: 3 * active_delegates - 1,
            max_headers: 5 * active_delegates,
        }
    }
}

/// Maintains per-delegate pre-vote/pre-commit counters over a bounded header window, deriving
/// `chainMaxHeightPrevoted` and `finalizedHeight`.
///
/// Single-threaded cooperative: callers must serialize `add_block_header`, `remove_block_headers`
/// and `recompute`; none of them suspend, so ordinary `&mut self` exclusivity is sufficient.
pub struct FinalityManager<S: FinalizedHeightStore = InMemoryFinalizedHeightStore> {
    active_delegates: u64,
    thresholds: Thresholds,
    headers: HeaderList,
    state: DelegateStateMap,
    tallies: VoteTallies,
    chain_max_height_prevoted: u64,
    store: Arc<S>,
    on_finality_changed: Option<FinalityChangedCallback>,
    on_window_shrink: Option<HeaderWindowShrinkCallback>,
}

impl FinalityManager<InMemoryFinalizedHeightStore> {
    /// Builds a manager backed by a non-persistent, in-process finalized-height store.
    pub fn new_in_memory(active_delegates: u64, initial_finalized_height: u64) -> Self {
        Self::new(
            active_delegates,
            Arc::new(InMemoryFinalizedHeightStore::new(initial_finalized_height)),
        )
    }
}

impl<S: FinalizedHeightStore> FinalityManager<S> {
    pub fn new(active_delegates: u64, store: Arc<S>) -> Self {
        let thresholds = Thresholds::new(active_delegates);
        Self {
            active_delegates,
            thresholds,
            headers: HeaderList::new(thresholds.max_headers as usize),
            state: DelegateStateMap::new(),
            tallies: VoteTallies::new(),
            chain_max_height_prevoted: 0,
            store,
            on_finality_changed: None,
            on_window_shrink: None,
        }
    }

    pub fn with_finality_changed_callback(mut self, callback: FinalityChangedCallback) -> Self {
        self.on_finality_changed = Some(callback);
        self
    }

    pub fn with_window_shrink_callback(mut self, callback: HeaderWindowShrinkCallback) -> Self {
        self.on_window_shrink = Some(callback);
        self
    }

    pub fn chain_max_height_prevoted(&self) -> u64 {
        self.chain_max_height_prevoted
    }

    pub fn finalized_height(&self) -> Result<u64, FinalityError> {
        self.store.load_finalized_height()
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Validates, accounts for, and appends `header`. See the module-level accounting walk for
    /// the pre-vote/pre-commit rules; errors leave all state untouched.
    pub fn add_block_header(&mut self, header: BlockHeader) -> Result<(), FinalityError> {
        header
            .validate_schema()
            .map_err(FinalityError::InvalidHeaderSchema)?;

        self.verify_block_header(&header)?;

        trace!(target: LOG_TARGET, "appending header at height {}", header.height);
        self.headers.append(header.clone());
        self.update_pre_votes_pre_commits(&header);
        self.update_pre_voted_and_finalized_height()?;
        self.tallies.trim(header.height, self.thresholds.max_headers);
        Ok(())
    }

    fn verify_block_header(&self, header: &BlockHeader) -> Result<(), FinalityError> {
        if self.headers.len() as u64 >= self.thresholds.processing
            && header.max_height_prevoted != self.chain_max_height_prevoted
        {
            return Err(FinalityError::InvalidAttribute {
                header: header.max_height_prevoted,
                local: self.chain_max_height_prevoted,
            });
        }

        let same_delegate = self
            .headers
            .top(self.thresholds.processing as usize)
            .into_iter()
            .rev()
            .find(|h| h.delegate_public_key == header.delegate_public_key);

        let Some(other) = same_delegate else {
            return Ok(());
        };

        let (earlier, later) = if (other.max_height_previously_forged, other.max_height_prevoted, other.height)
            <= (header.max_height_previously_forged, header.max_height_prevoted, header.height)
        {
            (other, header)
        } else {
            (header, other)
        };

        if earlier.max_height_prevoted == later.max_height_prevoted && earlier.height >= later.height {
            warn!(
                target: LOG_TARGET,
                "fork choice violation: delegate double-forged at height {}", earlier.height
            );
            return Err(FinalityError::ForkChoiceViolation {
                delegate: hex_preview(&header.delegate_public_key),
                height: earlier.height,
            });
        }
        if earlier.height > later.max_height_previously_forged {
            return Err(FinalityError::ChainDisjoint {
                earlier_height: earlier.height,
                later_forged: later.max_height_previously_forged,
            });
        }
        if earlier.max_height_prevoted > later.max_height_prevoted {
            return Err(FinalityError::LowerChainBranch {
                earlier_prevoted: earlier.max_height_prevoted,
                later_prevoted: later.max_height_prevoted,
            });
        }
        Ok(())
    }

    /// The heart of the design: updates `state`, `preVotes` and `preCommits` for `header`.
    fn update_pre_votes_pre_commits(&mut self, header: &BlockHeader) {
        if header.max_height_previously_forged >= header.height {
            // Equivocating on another chain; this header contributes no votes or commits.
            return;
        }

        let min_valid_commit_height = self.min_valid_commit_height(header);

        let delegate = header.delegate_public_key.clone();
        let pre_vote_threshold = self.thresholds.pre_vote;
        let max_pre_commit = self.state.get_or_default(&delegate).max_pre_commit;

        let commit_from = header
            .delegate_min_height_active
            .max(min_valid_commit_height)
            .max(max_pre_commit + 1);
        if header.height > 0 {
            for j in commit_from..header.height {
                if self.tallies.pre_votes_at(j) >= pre_vote_threshold {
                    self.tallies.add_pre_commit(j);
                    self.state.get_or_default(&delegate).max_pre_commit = j;
                }
            }
        }

        let max_pre_vote = self.state.get_or_default(&delegate).max_pre_vote;
        let vote_from = header
            .delegate_min_height_active
            .max(header.max_height_previously_forged + 1)
            .max(max_pre_vote + 1)
            .max(header.height.saturating_sub(self.thresholds.processing));
        for j in vote_from..=header.height {
            self.tallies.add_pre_vote(j);
        }
        self.state.get_or_default(&delegate).max_pre_vote = header.height;
    }

    /// Walks the `maxHeightPreviouslyForged` chain backward from `header` to find the lowest
    /// height at which this delegate may legitimately pre-commit.
    fn min_valid_commit_height(&self, header: &BlockHeader) -> u64 {
        let mut needle = header
            .max_height_previously_forged
            .max(header.height.saturating_sub(self.thresholds.processing));
        let search_till = self
            .headers
            .min_height()
            .unwrap_or(0)
            .max(header.height.saturating_sub(self.thresholds.processing));
        let mut current = header.clone();

        while needle >= search_till {
            if needle == current.max_height_previously_forged {
                let Some(prev) = self.headers.get(needle) else {
                    return 0;
                };
                if prev.delegate_public_key != header.delegate_public_key
                    || prev.max_height_previously_forged >= needle
                {
                    return needle + 1;
                }
                let prev_forged = prev.max_height_previously_forged;
                current = prev.clone();
                needle = prev_forged;
            } else {
                if needle == 0 {
                    break;
                }
                needle -= 1;
            }
        }
        needle.saturating_add(1).max(search_till)
    }

    /// Re-derives `chainMaxHeightPrevoted` and `finalizedHeight`, emitting `FinalityChanged` if
    /// the latter advanced.
    fn update_pre_voted_and_finalized_height(&mut self) -> Result<(), FinalityError> {
        if let Some(height) = self.tallies.highest_crossing_pre_vote(self.thresholds.pre_vote) {
            self.chain_max_height_prevoted = height;
        }

        if let Some(height) = self.tallies.highest_crossing_pre_commit(self.thresholds.pre_commit) {
            let current = self.store.load_finalized_height()?;
            if height > current {
                self.store.persist_finalized_height(height)?;
                debug!(target: LOG_TARGET, "finalized height advanced to {}", height);
                if let Some(callback) = &self.on_finality_changed {
                    callback(height);
                }
            }
        }
        Ok(())
    }

    /// Removes headers strictly above `above_height`, then replays vote/commit accounting for
    /// every remaining header in ascending order. `finalizedHeight` is never rolled back.
    pub fn remove_block_headers(&mut self, above_height: u64) -> Result<(), FinalityError> {
        self.headers.remove_above(above_height);
        self.recompute()
    }

    /// Zeroes transient state (`state`, `preVotes`, `preCommits`, `chainMaxHeightPrevoted`) and
    /// replays accounting over the current header window.
    pub fn recompute(&mut self) -> Result<(), FinalityError> {
        self.state.clear();
        self.tallies.clear();
        self.chain_max_height_prevoted = 0;

        let headers: Vec<BlockHeader> = self.headers.iter().cloned().collect();
        for header in &headers {
            self.update_pre_votes_pre_commits(header);
            self.update_pre_voted_and_finalized_height()?;
        }
        if let Some(max_height) = self.headers.max_height() {
            self.tallies.trim(max_height, self.thresholds.max_headers);
        }

        let two_rounds = 2 * self.active_delegates;
        if (self.headers.len() as u64) < two_rounds {
            warn!(
                target: LOG_TARGET,
                "header window shrank to {} (below two rounds of {})",
                self.headers.len(),
                two_rounds
            );
            if let Some(callback) = &self.on_window_shrink {
                callback(self.headers.len());
            }
        }
        Ok(())
    }

    /// Returns false exactly when `block` would violate double-forging or chain-disjoint rules
    /// for a *proposed* (not yet appended) block.
    pub fn is_bft_protocol_compliant(&self, block: Option<&BlockHeader>) -> Result<bool, FinalityError> {
        let block = block.ok_or(FinalityError::ArgumentMissing("block"))?;

        if block.max_height_previously_forged >= block.height {
            return Ok(false);
        }

        if block.height - block.max_height_previously_forged <= self.thresholds.processing + 2 {
            if let Some(forged_by) = self.headers.get(block.max_height_previously_forged) {
                if forged_by.delegate_public_key != block.delegate_public_key {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(height: u64, delegate: u8, forged: u64, prevoted: u64) -> BlockHeader {
        BlockHeader {
            id: format!("h{}", height),
            previous_block_id: None,
            height,
            delegate_public_key: vec![delegate],
            max_height_previously_forged: forged,
            max_height_prevoted: prevoted,
            delegate_min_height_active: 0,
            timestamp: height,
            received_at: height,
        }
    }

    #[test]
    fn rejects_invalid_schema() {
        let mut manager = FinalityManager::new_in_memory(7, 0);
        let mut bad = header(1, 1, 0, 0);
        bad.delegate_public_key.clear();
        assert!(matches!(
            manager.add_block_header(bad),
            Err(FinalityError::InvalidHeaderSchema(_))
        ));
    }

    #[test]
    fn equivocating_header_contributes_no_votes() {
        let mut manager = FinalityManager::new_in_memory(7, 0);
        // D=7: processingThreshold = 3*7-1 = 20, so forged >= height is required to equivocate.
        let h = header(150, 9, 200, 0);
        manager.add_block_header(h).unwrap();
        assert_eq!(manager.tallies.pre_votes.len(), 0);
        assert_eq!(manager.tallies.pre_commits.len(), 0);
    }

    #[test]
    fn s1_finalization_across_rounds() {
        // S1 - D=101, 303 valid headers, delegates cycling, forged = height - 101 (or 0).
        let d = 101u64;
        let mut manager = FinalityManager::new_in_memory(d, 0);
        let mut max_prevoted = 0u64;
        for height in 1..=303u64 {
            let delegate = ((height - 1) % d) as u8;
            let forged = if height > d { height - d } else { 0 };
            let mut h = header(height, delegate, forged, max_prevoted);
            h.max_height_prevoted = max_prevoted;
            manager.add_block_header(h).unwrap();
            max_prevoted = manager.chain_max_height_prevoted();
            if height == 202 {
                assert!(manager.finalized_height().unwrap() >= 1, "expected finality by header 202");
            }
        }
        assert!(manager.finalized_height().unwrap() >= 101, "expected finality >= 101 by header 303");
    }

    #[test]
    fn finalized_height_is_monotonic() {
        let mut manager = FinalityManager::new_in_memory(4, 0);
        let mut last = 0u64;
        let mut previous_finalized = 0u64;
        for height in 1..=40u64 {
            let delegate = ((height - 1) % 4) as u8;
            let forged = if height > 4 { height - 4 } else { 0 };
            let h = header(height, delegate, forged, last);
            let _ = manager.add_block_header(h);
            last = manager.chain_max_height_prevoted();
            let current = manager.finalized_height().unwrap();
            assert!(current >= previous_finalized, "finalized height must never roll back");
            previous_finalized = current;
        }
    }

    #[test]
    fn remove_then_recompute_clears_tallies_above() {
        let mut manager = FinalityManager::new_in_memory(4, 0);
        for height in 1..=10u64 {
            let delegate = ((height - 1) % 4) as u8;
            let forged = if height > 4 { height - 4 } else { 0 };
            let h = header(height, delegate, forged, 0);
            let _ = manager.add_block_header(h);
        }
        manager.remove_block_headers(5).unwrap();
        assert!(manager.tallies.pre_votes.keys().all(|h| *h <= 5));
        assert!(manager.tallies.pre_commits.keys().all(|h| *h <= 5));
    }

    #[test]
    fn bft_compliance_rejects_equivocation() {
        let mut manager = FinalityManager::new_in_memory(7, 0);
        manager.add_block_header(header(10, 1, 0, 0)).unwrap();
        let proposed = header(5, 1, 10, 0);
        assert!(!manager.is_bft_protocol_compliant(Some(&proposed)).unwrap());
    }

    #[test]
    fn bft_compliance_missing_block_errors() {
        let manager = FinalityManager::new_in_memory(7, 0);
        assert!(matches!(
            manager.is_bft_protocol_compliant(None),
            Err(FinalityError::ArgumentMissing("block"))
        ));
    }
}
