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

//! Base types the chain query surface is built on.

use poolchain_util::{from_hex, to_hex};

/// Identifier of a single transaction inside a stored pool. On the
/// wire it reads `UPPERCASE_HEX(pool_hash) + "." + DECIMAL(index)`,
/// the index being 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId {
	/// Hash of the pool holding the transaction
	pub pool_hash: Vec<u8>,
	/// Zero-based index of the transaction within its pool
	pub index: u64,
}

impl TransactionId {
	/// Renders the wire form of this identifier.
	pub fn to_wire(&self) -> String {
		format!("{}.{}", to_hex(&self.pool_hash), self.index + 1)
	}

	/// Parses a wire identifier. Returns `None` unless the hex prefix
	/// is non-empty and spans every character before the dot, and the
	/// tail is a positive decimal consuming the rest of the string.
	pub fn parse(id: &str) -> Option<TransactionId> {
		let pool_hash = from_hex(id);
		if pool_hash.is_empty() {
			return None;
		}
		let dot = pool_hash.len() * 2;
		if id.len() < dot + 2 || id.as_bytes()[dot] != b'.' {
			return None;
		}
		let index: u64 = id[dot + 1..].parse().ok()?;
		if index == 0 {
			return None;
		}
		Some(TransactionId {
			pool_hash,
			index: index - 1,
		})
	}
}
