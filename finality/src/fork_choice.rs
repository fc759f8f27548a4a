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
use crate::header::BlockHeader;

/// Outcome of classifying an incoming block against the current tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkChoiceOutcome {
    Identical,
    Valid,
    DoubleForging,
    TieBreak,
    DifferentChain,
    Discard,
}

/// Classifies `new_block` against `last_block`. Evaluation order is load-bearing: identical is
/// checked before valid so a re-delivered tip is never double-counted, and double-forging is
/// checked before the tie-break so same-delegate equivocation is always flagged rather than
/// resolved by timestamp.
pub fn classify(
    new_block: Option<&BlockHeader>,
    last_block: Option<&BlockHeader>,
) -> Result<ForkChoiceOutcome, FinalityError> {
    let new_block = new_block.ok_or(FinalityError::ArgumentMissing("newBlock"))?;
    let last_block = last_block.ok_or(FinalityError::ArgumentMissing("lastBlock"))?;

    if new_block.id == last_block.id {
        return Ok(ForkChoiceOutcome::Identical);
    }

    let is_direct_child = new_block.previous_block_id.as_deref() == Some(last_block.id.as_str())
        && new_block.height == last_block.height + 1;
    if is_direct_child {
        return Ok(ForkChoiceOutcome::Valid);
    }

    let same_height_and_prevote_and_parent = new_block.height == last_block.height
        && new_block.max_height_prevoted == last_block.max_height_prevoted
        && new_block.previous_block_id == last_block.previous_block_id;

    if same_height_and_prevote_and_parent {
        if new_block.delegate_public_key == last_block.delegate_public_key {
            return Ok(ForkChoiceOutcome::DoubleForging);
        }
        let new_lateness = new_block.received_at.saturating_sub(new_block.timestamp);
        let last_lateness = last_block.received_at.saturating_sub(last_block.timestamp);
        if new_lateness <= last_lateness {
            return Ok(ForkChoiceOutcome::TieBreak);
        }
        return Ok(ForkChoiceOutcome::Discard);
    }

    let is_different_chain = new_block.max_height_prevoted > last_block.max_height_prevoted
        || (new_block.height > last_block.height
            && new_block.max_height_prevoted == last_block.max_height_prevoted);
    if is_different_chain {
        return Ok(ForkChoiceOutcome::DifferentChain);
    }

    Ok(ForkChoiceOutcome::Discard)
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(id: &str, height: u64, prevoted: u64, delegate: u8, previous: Option<&str>) -> BlockHeader {
        BlockHeader {
            id: id.to_string(),
            previous_block_id: previous.map(|s| s.to_string()),
            height,
            delegate_public_key: vec![delegate],
            max_height_previously_forged: 0,
            max_height_prevoted: prevoted,
            delegate_min_height_active: 0,
            timestamp: 0,
            received_at: 0,
        }
    }

    #[test]
    fn missing_args_error() {
        let h = header("1", 1, 0, 1, None);
        assert!(matches!(
            classify(None, Some(&h)),
            Err(FinalityError::ArgumentMissing("newBlock"))
        ));
        assert!(matches!(
            classify(Some(&h), None),
            Err(FinalityError::ArgumentMissing("lastBlock"))
        ));
    }

    #[test]
    fn identical_wins_over_valid() {
        let last = header("1", 10, 5, 1, None);
        let new = header("1", 10, 5, 1, None);
        assert_eq!(classify(Some(&new), Some(&last)).unwrap(), ForkChoiceOutcome::Identical);
    }

    #[test]
    fn valid_direct_child() {
        let last = header("1", 10, 5, 1, None);
        let new = header("2", 11, 5, 1, Some("1"));
        assert_eq!(classify(Some(&new), Some(&last)).unwrap(), ForkChoiceOutcome::Valid);
    }

    #[test]
    fn double_forging_same_delegate() {
        let last = header("1", 10, 5, 1, Some("0"));
        let new = header("2", 10, 5, 1, Some("0"));
        assert_eq!(
            classify(Some(&new), Some(&last)).unwrap(),
            ForkChoiceOutcome::DoubleForging
        );
    }

    #[test]
    fn tie_break_on_earlier_received_at() {
        let mut last = header("1", 10, 5, 1, Some("0"));
        last.timestamp = 1000;
        last.received_at = 2000;
        let mut new = header("2", 10, 5, 2, Some("0"));
        new.timestamp = 1000;
        new.received_at = 1500;
        assert_eq!(classify(Some(&new), Some(&last)).unwrap(), ForkChoiceOutcome::TieBreak);
    }

    #[test]
    fn different_chain_on_higher_prevote() {
        let last = header("1", 10, 5, 1, Some("0"));
        let new = header("2", 9, 6, 2, Some("x"));
        assert_eq!(
            classify(Some(&new), Some(&last)).unwrap(),
            ForkChoiceOutcome::DifferentChain
        );
    }

    #[test]
    fn discard_otherwise() {
        let last = header("1", 10, 5, 1, Some("0"));
        let new = header("2", 5, 2, 2, Some("x"));
        assert_eq!(classify(Some(&new), Some(&last)).unwrap(), ForkChoiceOutcome::Discard);
    }
}
