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
use std::collections::VecDeque;

/// A delegate's public key. Opaque to this crate; cryptographic verification is a collaborator's
/// concern.
pub type DelegatePublicKey = Vec<u8>;

/// A block header as ingested by the [`FinalityManager`](crate::manager::FinalityManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: String,
    pub previous_block_id: Option<String>,
    pub height: u64,
    pub delegate_public_key: DelegatePublicKey,
    pub max_height_previously_forged: u64,
    pub max_height_prevoted: u64,
    pub delegate_min_height_active: u64,
    /// Block timestamp, assigned by the forging delegate.
    pub timestamp: u64,
    /// Local clock timestamp at ingestion, used by the fork-choice tie-break rule.
    pub received_at: u64,
}

impl BlockHeader {
    /// Basic schema validation: a header must carry a non-empty id and a delegate key.
    pub fn validate_schema(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("header id must not be empty".to_string());
        }
        if self.delegate_public_key.is_empty() {
            return Err("header delegatePublicKey must not be empty".to_string());
        }
        Ok(())
    }
}

/// A bounded ring of the most recent headers, ordered ascending by height.
///
/// Mirrors the bounded-ring role the teacher's sync validator keeps for timestamps, sized here to
/// `active_delegates * 5` as required by the finalization window.
#[derive(Debug, Clone)]
pub struct HeaderList {
    capacity: usize,
    headers: VecDeque<BlockHeader>,
}

impl HeaderList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            headers: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends `header`, evicting the oldest entry if the list is at capacity.
    ///
    /// Only the highest-height header may be appended; callers are expected to have already
    /// ordered headers monotonically (the `FinalityManager` enforces this upstream).
    pub fn append(&mut self, header: BlockHeader) {
        if self.headers.len() == self.capacity {
            self.headers.pop_front();
        }
        self.headers.push_back(header);
    }

    /// Removes every header strictly above `height`.
    pub fn remove_above(&mut self, height: u64) {
        while matches!(self.headers.back(), Some(h) if h.height > height) {
            self.headers.pop_back();
        }
    }

    pub fn get(&self, height: u64) -> Option<&BlockHeader> {
        self.headers.iter().find(|h| h.height == height)
    }

    pub fn first(&self) -> Option<&BlockHeader> {
        self.headers.front()
    }

    pub fn last(&self) -> Option<&BlockHeader> {
        self.headers.back()
    }

    /// The most recent `n` headers, oldest first.
    pub fn top(&self, n: usize) -> Vec<&BlockHeader> {
        let len = self.headers.len();
        let skip = len.saturating_sub(n);
        self.headers.iter().skip(skip).collect()
    }

    pub fn min_height(&self) -> Option<u64> {
        self.first().map(|h| h.height)
    }

    pub fn max_height(&self) -> Option<u64> {
        self.last().map(|h| h.height)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BlockHeader> {
        self.headers.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(height: u64) -> BlockHeader {
        BlockHeader {
            id: format!("h{}", height),
            previous_block_id: None,
            height,
            delegate_public_key: vec![1, 2, 3],
            max_height_previously_forged: 0,
            max_height_prevoted: 0,
            delegate_min_height_active: 0,
            timestamp: height,
            received_at: height,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut list = HeaderList::new(3);
        for h in 1..=4 {
            list.append(header(h));
        }
        assert_eq!(list.min_height(), Some(2));
        assert_eq!(list.max_height(), Some(4));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn remove_above_trims_tail() {
        let mut list = HeaderList::new(10);
        for h in 1..=5 {
            list.append(header(h));
        }
        list.remove_above(3);
        assert_eq!(list.max_height(), Some(3));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn top_n_returns_most_recent() {
        let mut list = HeaderList::new(10);
        for h in 1..=5 {
            list.append(header(h));
        }
        let top = list.top(2);
        assert_eq!(top.iter().map(|h| h.height).collect::<Vec<_>>(), vec![4, 5]);
    }
}
