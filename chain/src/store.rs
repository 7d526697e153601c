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

//! Implements the pool storage primitives required by the chain: the
//! append-only main store keyed by pool hash.

use poolchain_core::pool::Pool;
use poolchain_core::ser;
use poolchain_store::option_to_not_found;
use poolchain_util::to_hex;

use crate::error::{Error, ErrorKind};

/// The main store: raw pools, keyed by their caller-assigned hash.
/// Pools are immutable once written and survive every restart.
pub struct PoolStore {
	db: poolchain_store::Store,
}

impl PoolStore {
	/// Opens the pool store at the given path, creating it if missing.
	pub fn new(path: &str) -> Result<PoolStore, Error> {
		let db = poolchain_store::Store::open(path)?;
		Ok(PoolStore { db })
	}

	/// Whether a pool with this hash has already been written.
	pub fn exists(&self, hash: &[u8]) -> Result<bool, Error> {
		self.db.exists(hash).map_err(From::from)
	}

	/// Persists a new pool under `hash` in a single write. An empty
	/// hash is rejected, as is a hash already present: pools are
	/// immutable and a colliding hash is a caller error.
	pub fn save_pool(&self, hash: &[u8], pool: &Pool) -> Result<(), Error> {
		if hash.is_empty() {
			error!("save_pool: cannot store a pool under an empty hash");
			return Err(ErrorKind::InvalidArgument("empty pool hash".to_owned()).into());
		}
		if self.exists(hash)? {
			error!(
				"save_pool: pool with hash {} already exists",
				to_hex(hash)
			);
			return Err(ErrorKind::AlreadyExists(to_hex(hash)).into());
		}
		self.db.put_ser(hash, pool).map_err(|e| {
			error!("save_pool: store failure for pool {}: {}", to_hex(hash), e);
			Error::from(e)
		})
	}

	/// Reads and strictly decodes the pool stored under `hash`.
	pub fn get_pool(&self, hash: &[u8]) -> Result<Pool, Error> {
		let value = option_to_not_found(self.db.get(hash), &to_hex(hash)).map_err(|e| {
			if let poolchain_store::Error::RocksDbErr(_) = e {
				error!("pool read failed for hash {}: {}", to_hex(hash), e);
			}
			Error::from(e)
		})?;
		decode_pool(hash, &value)
	}

	/// Raw (key, value) scan over every stored pool, in key order.
	pub fn iter(&self) -> poolchain_store::RawIterator<'_> {
		self.db.iter()
	}

	/// Whether at least one pool has been stored, chained or not.
	pub fn has_any_pools(&self) -> Result<bool, Error> {
		Ok(!self.db.is_empty()?)
	}
}

/// Decodes a stored pool value, classifying any failure (header decode,
/// body not a whole number of transaction records, count disagreeing
/// with the header) as corruption of that record.
pub fn decode_pool(hash: &[u8], value: &[u8]) -> Result<Pool, Error> {
	match ser::deserialize::<Pool>(value) {
		Ok(pool) => Ok(pool),
		Err(e) => {
			warn!("invalid pool under hash {}: {}", to_hex(hash), e);
			Err(ErrorKind::Corrupt(to_hex(hash)).into())
		}
	}
}
