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

use crate::header::DelegatePublicKey;
use std::collections::{BTreeMap, HashMap};

/// Per-delegate high-water marks, keyed by delegate public key bytes. Bounded above by the number
/// of active delegates; never grows past that without also evicting via `retain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegateState {
    pub max_pre_vote: u64,
    pub max_pre_commit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DelegateStateMap {
    inner: HashMap<DelegatePublicKey, DelegateState>,
}

impl DelegateStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_default(&mut self, delegate: &DelegatePublicKey) -> &mut DelegateState {
        self.inner.entry(delegate.clone()).or_default()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

/// `preVotes`/`preCommits` tallies keyed by height, trimmed to the last `max_headers` heights
/// after every mutation so the map never outgrows the header window it accounts for.
#[derive(Debug, Clone, Default)]
pub struct VoteTallies {
    pub pre_votes: BTreeMap<u64, u64>,
    pub pre_commits: BTreeMap<u64, u64>,
}

impl VoteTallies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.pre_votes.clear();
        self.pre_commits.clear();
    }

    pub fn add_pre_vote(&mut self, height: u64) {
        *self.pre_votes.entry(height).or_insert(0) += 1;
    }

    pub fn add_pre_commit(&mut self, height: u64) {
        *self.pre_commits.entry(height).or_insert(0) += 1;
    }

    pub fn pre_votes_at(&self, height: u64) -> u64 {
        self.pre_votes.get(&height).copied().unwrap_or(0)
    }

    /// Retains only entries for heights `> floor_height.saturating_sub(max_headers)`, i.e. the
    /// last `max_headers` heights relative to `floor_height`.
    pub fn trim(&mut self, floor_height: u64, max_headers: u64) {
        let cutoff = floor_height.saturating_sub(max_headers);
        self.pre_votes.retain(|height, _| *height > cutoff);
        self.pre_commits.retain(|height, _| *height > cutoff);
    }

    /// Highest height with `preVotes[height] >= threshold`, scanning by height descending.
    pub fn highest_crossing_pre_vote(&self, threshold: u64) -> Option<u64> {
        self.pre_votes
            .iter()
            .rev()
            .find(|(_, count)| **count >= threshold)
            .map(|(height, _)| *height)
    }

    /// Highest height with `preCommits[height] >= threshold`, scanning by height descending.
    pub fn highest_crossing_pre_commit(&self, threshold: u64) -> Option<u64> {
        self.pre_commits
            .iter()
            .rev()
            .find(|(_, count)| **count >= threshold)
            .map(|(height, _)| *height)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trims_to_window() {
        let mut tallies = VoteTallies::new();
        for h in 1..=10 {
            tallies.add_pre_vote(h);
        }
        tallies.trim(10, 5);
        assert_eq!(tallies.pre_votes.keys().min().copied(), Some(6));
        assert_eq!(tallies.pre_votes.keys().max().copied(), Some(10));
    }

    #[test]
    fn highest_crossing_scans_descending() {
        let mut tallies = VoteTallies::new();
        tallies.pre_votes.insert(5, 3);
        tallies.pre_votes.insert(8, 7);
        tallies.pre_votes.insert(9, 2);
        assert_eq!(tallies.highest_crossing_pre_vote(5), Some(8));
    }
}
