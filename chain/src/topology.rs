// Copyright 2021 The Poolchain Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Online reconstruction of the chain topology from an unordered
//! stream of (pool, previous-pool) edges. The startup scan feeds every
//! stored pool through here; external analysis tooling replays single
//! records the same way, so the map-of-hashes form is part of the
//! public surface.

use std::collections::BTreeMap;

/// State of one known sub-chain, keyed in `HeadMap` by the hash of its
/// youngest pool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
	/// Number of pools in the sub-chain
	pub len: u64,
	/// Previous-pool hash referenced by the oldest pool of the
	/// sub-chain; empty once the sub-chain reaches a chain root.
	pub next: Vec<u8>,
}

/// Sub-chain state keyed by youngest-pool hash. After a full scan the
/// store is healthy iff exactly one entry has an empty `next`.
pub type HeadMap = BTreeMap<Vec<u8>, HeadInfo>;

/// Dangling parent hash mapped to the head of the sub-chain whose
/// oldest pool references it.
pub type TailMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Feeds one pool edge into the head and tail indices. Pools may
/// arrive in any order; after every call the indices describe the
/// maximal sub-chains assembled so far.
///
/// An edge closing a loop degenerates into a sub-chain merging with
/// itself and erases the affected head; callers detect this by
/// comparing the number of edges fed against the summed sub-chain
/// lengths once the scan is complete.
pub fn update_heads_and_tails(heads: &mut HeadMap, tails: &mut TailMap, cur: &[u8], prev: &[u8]) {
	let in_heads = heads.contains_key(prev);
	let in_tails = tails.contains_key(cur);

	if in_heads && in_tails {
		// The new pool closes the gap between the sub-chain headed by
		// `prev` and the one that was waiting on `cur`.
		let upper = heads[prev].clone();
		let lower_head = tails[cur].clone();
		{
			let info = heads
				.get_mut(&lower_head)
				.expect("tail entry points at a live head");
			info.next = upper.next.clone();
			info.len += 1 + upper.len;
		}
		if !upper.next.is_empty() {
			tails.insert(upper.next, lower_head);
		}
		heads.remove(prev);
		// the insert above may already have replaced this entry
		tails.remove(cur);
	} else if in_heads {
		// A new youngest pool stacked on top of an existing sub-chain.
		let upper = heads[prev].clone();
		if !upper.next.is_empty() {
			tails.insert(upper.next.clone(), cur.to_vec());
		}
		heads.insert(
			cur.to_vec(),
			HeadInfo {
				len: upper.len + 1,
				next: upper.next,
			},
		);
		heads.remove(prev);
	} else if in_tails {
		// The new pool extends the bottom of the sub-chain waiting on
		// it, leaving `prev` dangling instead.
		let head = tails.remove(cur).expect("checked above");
		{
			let info = heads
				.get_mut(&head)
				.expect("tail entry points at a live head");
			info.next = prev.to_vec();
			info.len += 1;
		}
		if !prev.is_empty() {
			tails.insert(prev.to_vec(), head);
		}
	} else {
		// No overlap with anything known; a sub-chain of its own.
		heads.insert(
			cur.to_vec(),
			HeadInfo {
				len: 1,
				next: prev.to_vec(),
			},
		);
		if !prev.is_empty() {
			tails.insert(prev.to_vec(), cur.to_vec());
		}
	}
}
