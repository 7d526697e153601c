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

//! The chain context. Owns the two stores, tracks the head pointers
//! and serves every public operation; dropping it closes the database.

use std::fs;
use std::path::Path;

use poolchain_core::amount::Amount;
use poolchain_core::pool::{Pool, PoolHeader};
use poolchain_core::transaction::Transaction;
use poolchain_util::{to_hex, Mutex, RwLock};

use crate::balance::BalanceStore;
use crate::error::{Error, ErrorKind};
use crate::store::{decode_pool, PoolStore};
use crate::topology::{update_heads_and_tails, HeadMap, TailMap};
use crate::types::TransactionId;

/// Subdirectory of the base path holding the persistent pool store.
const MAIN_SUBDIR: &str = "transactions";
/// Subdirectory holding the derived balance index.
const BALANCE_SUBDIR: &str = "balance";

/// An opened transaction-chain database.
///
/// All mutating operations assume a single writer; queries may run
/// from any thread for as long as the value lives. Pools are immutable
/// once written and the balance index is only ever mutated by the
/// write path or the startup rebuild.
pub struct Chain {
	pools: PoolStore,
	balances: BalanceStore,
	/// held across one full balance update
	balance_lock: Mutex<()>,
	current_head_hash: RwLock<Vec<u8>>,
	last_save_hash: RwLock<Vec<u8>>,
}

impl Chain {
	/// Opens the database under `db_root`, or under a default
	/// directory in the user's home when `None`. The balance index is
	/// always destroyed and rebuilt by replaying every stored pool,
	/// and the chain topology is reconstructed from scratch; this can
	/// take a while on a large store. Fails unless the stored pools
	/// resolve to exactly one rooted chain (an empty store resolves to
	/// an empty head).
	pub fn init(db_root: Option<&str>) -> Result<Chain, Error> {
		let base = match db_root {
			Some(path) => {
				if !Path::new(path).is_dir() {
					error!("cannot access database directory: {}", path);
					return Err(ErrorKind::InvalidArgument(format!(
						"no such directory: {}",
						path
					))
					.into());
				}
				path.trim_end_matches('/').to_owned()
			}
			None => default_db_root()?,
		};

		let pools = PoolStore::new(&format!("{}/{}", base, MAIN_SUBDIR))?;
		let balances = BalanceStore::rebuild(&format!("{}/{}", base, BALANCE_SUBDIR))?;

		let chain = Chain {
			pools,
			balances,
			balance_lock: Mutex::new(()),
			current_head_hash: RwLock::new(vec![]),
			last_save_hash: RwLock::new(vec![]),
		};
		chain.scan()?;
		Ok(chain)
	}

	/// Writes a new pool of transactions under `pool_hash`, linked to
	/// `prev_hash` (empty for a chain root). The parent does not have
	/// to exist yet: chains may be assembled out of order, and only a
	/// pool extending the current head advances it; anything else is
	/// resolved by the rebuild at next init.
	///
	/// A failed balance update is logged but does not fail the write:
	/// the pool is already durable and the index is repaired by the
	/// next rebuild.
	pub fn save_pool(
		&self,
		pool_hash: &[u8],
		prev_hash: &[u8],
		transactions: Vec<Transaction>,
		time: u64,
		sequence: u64,
	) -> Result<(), Error> {
		let header = PoolHeader {
			prev_pool_hash: prev_hash.to_vec(),
			time,
			sequence,
			transaction_count: transactions.len() as u64,
		};
		let pool = Pool {
			header,
			transactions,
		};
		self.pools.save_pool(pool_hash, &pool)?;

		*self.last_save_hash.write() = pool_hash.to_vec();

		{
			let mut head = self.current_head_hash.write();
			if *head == pool.header.prev_pool_hash {
				*head = pool_hash.to_vec();
			}
		}

		{
			let _lock = self.balance_lock.lock();
			if let Err(e) = self.balances.update_balances(&pool.transactions) {
				error!(
					"balance update failed for pool {}: {}; the index is stale until the next init",
					to_hex(pool_hash),
					e
				);
			}
		}

		Ok(())
	}

	/// Fetches and strictly decodes a pool. `None` reads back the most
	/// recently written pool, which is an error when nothing has been
	/// written since init.
	pub fn get_pool(&self, hash: Option<&[u8]>) -> Result<Pool, Error> {
		let hash = match hash {
			Some(h) => h.to_vec(),
			None => {
				let last = self.last_save_hash.read().clone();
				if last.is_empty() {
					error!("get_pool: no pool has been saved since init");
					return Err(
						ErrorKind::InvalidArgument("no last saved pool".to_owned()).into(),
					);
				}
				last
			}
		};
		if hash.is_empty() {
			return Err(ErrorKind::InvalidArgument("empty pool hash".to_owned()).into());
		}
		self.pools.get_pool(&hash)
	}

	/// Whether the store holds at least one pool, chained or not.
	pub fn has_any_pools(&self) -> Result<bool, Error> {
		self.pools.has_any_pools()
	}

	/// Hash of the head pool of the current chain; empty when the
	/// store is empty.
	pub fn head_hash(&self) -> Vec<u8> {
		self.current_head_hash.read().clone()
	}

	/// Balance of `account` in `currency`; zero for an unknown account
	/// or currency.
	pub fn get_balance(&self, account: &[u8], currency: &[u8]) -> Result<Amount, Error> {
		self.balances.get_balance(account, currency)
	}

	/// Pages through the transaction history of one account, newest
	/// first: pools are walked from the current head down the
	/// previous-pool links, transactions within a pool in reverse
	/// insertion order. Returns the wire identifiers of the matches
	/// numbered `offset` up to `offset + limit`, and whether more
	/// matches remain beyond them. A chain break or corrupt pool
	/// mid-walk yields an empty page.
	pub fn get_transactions(&self, addr: &[u8], limit: usize, offset: usize) -> (Vec<String>, bool) {
		match self.walk_transactions(addr, limit, offset) {
			Ok(page) => page,
			Err(_) => (vec![], false),
		}
	}

	fn walk_transactions(
		&self,
		addr: &[u8],
		limit: usize,
		offset: usize,
	) -> Result<(Vec<String>, bool), Error> {
		let mut ids = vec![];
		let mut index: usize = 0;
		let mut hash = self.head_hash();

		while !hash.is_empty() {
			let pool = self.pools.get_pool(&hash).map_err(|e| {
				if e.is_not_found() {
					error!(
						"unexpected chain break - pool not found for hash: {}",
						to_hex(&hash)
					);
				}
				e
			})?;

			for (i, tx) in pool.transactions.iter().enumerate().rev() {
				if !tx.involves(addr) {
					continue;
				}
				if index >= offset.saturating_add(limit) {
					return Ok((ids, true));
				}
				if index >= offset {
					let id = TransactionId {
						pool_hash: hash.clone(),
						index: i as u64,
					};
					ids.push(id.to_wire());
				}
				index += 1;
			}
			hash = pool.header.prev_pool_hash.clone();
		}

		Ok((ids, false))
	}

	/// Looks up a single transaction by its wire identifier. Any
	/// mismatch - unparseable identifier, unknown pool, index out of
	/// range - reads as not found.
	pub fn get_transaction_info(&self, transaction_id: &str) -> Result<Transaction, Error> {
		let id = match TransactionId::parse(transaction_id) {
			Some(id) => id,
			None => return Err(ErrorKind::NotFound.into()),
		};
		let pool = self.pools.get_pool(&id.pool_hash)?;
		match pool.transactions.get(id.index as usize) {
			Some(tx) => Ok(tx.clone()),
			None => Err(ErrorKind::NotFound.into()),
		}
	}

	/// Full scan of the pool store: replays every valid pool's
	/// transactions into the freshly rebuilt balance index, feeds the
	/// topology tracker and resolves the unique rooted head. Corrupt
	/// pools are skipped so a partially damaged store still surfaces
	/// its valid chain.
	fn scan(&self) -> Result<(), Error> {
		let mut heads = HeadMap::new();
		let mut tails = TailMap::new();
		let mut valid_pools: u64 = 0;

		for item in self.pools.iter() {
			let (key, value) = item?;
			let pool = match decode_pool(&key, &value) {
				Ok(pool) => pool,
				// already logged; the record stays in the store but
				// contributes nothing to topology or balances
				Err(_) => continue,
			};
			if !pool.transactions.is_empty() {
				self.balances.update_balances(&pool.transactions)?;
			}
			update_heads_and_tails(&mut heads, &mut tails, &key, &pool.header.prev_pool_hash);
			valid_pools += 1;
		}

		let mut rooted: Vec<Vec<u8>> = heads
			.iter()
			.filter(|(_, info)| info.next.is_empty())
			.map(|(hash, _)| hash.clone())
			.collect();

		let head = if heads.is_empty() {
			vec![]
		} else if rooted.len() == 1 {
			rooted.pop().expect("length checked")
		} else {
			error!("database prescan errors");
			error!("encountered zero or multiple rooted chains; list follows:");
			for (hash, info) in &heads {
				error!(
					"  {} (length = {}): {}",
					to_hex(hash),
					info.len,
					if info.next.is_empty() {
						"Normal"
					} else {
						"Orphan"
					}
				);
			}
			return Err(ErrorKind::ChainBroken("zero or multiple rooted chains".to_owned()).into());
		};

		// A looping or self-overlapping chain merges a sub-chain into
		// itself and swallows its pools, which no per-edge check can
		// see; the global count can.
		let chained: u64 = heads.values().map(|info| info.len).sum();
		if chained != valid_pools {
			error!(
				"database prescan errors: {} pools scanned but {} chained; the store contains a looping or overlapping chain",
				valid_pools, chained
			);
			return Err(ErrorKind::ChainBroken(format!(
				"{} pools scanned, {} chained",
				valid_pools, chained
			))
			.into());
		}

		*self.current_head_hash.write() = head;
		Ok(())
	}
}

fn default_db_root() -> Result<String, Error> {
	let home = dirs::home_dir()
		.ok_or_else(|| Error::from(ErrorKind::InvalidArgument("no home directory".to_owned())))?;
	let path = home.join(".poolchain").join("database");
	fs::create_dir_all(&path)?;
	Ok(path.to_string_lossy().into_owned())
}
