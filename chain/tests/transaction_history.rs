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

use poolchain_util as util;

use std::fs;

use poolchain_chain::{Chain, ErrorKind};
use poolchain_core::amount::Amount;
use poolchain_core::transaction::Transaction;
use uuid::Uuid;

fn clean_output_dir(dir_name: &str) {
	let _ = fs::remove_dir_all(dir_name);
}

fn setup(dir_name: &str) {
	util::init_test_logger();
	clean_output_dir(dir_name);
	fs::create_dir_all(dir_name).unwrap();
}

fn tx(source: &str, target: &str, amount: u32, amount1: u64, currency: &str) -> Transaction {
	Transaction::new(0, Uuid::new_v4(), source, target, amount, amount1, currency)
}

/// Two pools: a root with two CS transfers between two clients, then a
/// child with two payouts and two fees.
fn write_sample_chain(chain: &Chain) {
	chain
		.save_pool(
			b"\x0A",
			b"",
			vec![
				tx("Client 1", "Client 2", 100, 10_000_000_000_000_000, "CS"),
				tx("Client 2", "Client 1", 50, 20_000_000_000_000_000, "CS"),
			],
			1_500_000_000,
			1,
		)
		.unwrap();
	chain
		.save_pool(
			b"\x0B",
			b"\x0A",
			vec![
				tx("Milking cow 1", "Client 1", 100_000, 0, "RUB"),
				tx("Milking cow 1", "Fee Accumulator", 0, 5_000_000_000_000_000, "CS"),
				tx("Milking cow 2", "Client 1", 100, 0, "USD"),
				tx("Milking cow 2", "Fee Accumulator", 0, 5_000_000_000_000_000, "CS"),
			],
			1_500_000_100,
			2,
		)
		.unwrap();
}

fn assert_balance(chain: &Chain, account: &str, currency: &str, expected: Amount) {
	let balance = chain
		.get_balance(account.as_bytes(), currency.as_bytes())
		.unwrap();
	assert_eq!(balance, expected, "{} in {}", account, currency);
}

fn assert_balances(chain: &Chain) {
	assert_balance(chain, "Client 1", "CS", Amount::new(-50, 10_000_000_000_000_000));
	assert_balance(chain, "Client 2", "CS", Amount::new(49, 990_000_000_000_000_000));
	assert_balance(chain, "Client 1", "RUB", Amount::new(100_000, 0));
	assert_balance(chain, "Client 1", "USD", Amount::new(100, 0));
	assert_balance(
		chain,
		"Fee Accumulator",
		"CS",
		Amount::new(0, 10_000_000_000_000_000),
	);
	assert_balance(
		chain,
		"Milking cow 1",
		"CS",
		Amount::new(-1, 995_000_000_000_000_000),
	);
	assert_balance(chain, "Milking cow 1", "RUB", Amount::new(-100_000, 0));
	assert_balance(chain, "Milking cow 2", "USD", Amount::new(-100, 0));
	// unknown account and unknown currency both read as zero
	assert_balance(chain, "Client 3", "CS", Amount::new(0, 0));
	assert_balance(chain, "Client 1", "EUR", Amount::new(0, 0));

	assert_eq!(
		chain
			.get_balance(b"Client 1", b"CS")
			.unwrap()
			.to_decimal(0),
		"-49.99"
	);
	assert_eq!(
		chain
			.get_balance(b"Fee Accumulator", b"CS")
			.unwrap()
			.to_decimal(2),
		"0.01"
	);
}

#[test]
fn history_is_paged_newest_first() {
	let dir = "test_output/history_paging";
	setup(dir);
	{
		let chain = Chain::init(Some(dir)).unwrap();
		write_sample_chain(&chain);
		assert_eq!(chain.head_hash(), b"\x0B".to_vec());

		// reverse intra-pool order within the newest pool first
		let (ids, has_more) = chain.get_transactions(b"Client 1", 999, 0);
		assert_eq!(ids, vec!["0B.3", "0B.1", "0A.2", "0A.1"]);
		assert!(!has_more);

		let (ids, has_more) = chain.get_transactions(b"Client 1", 2, 0);
		assert_eq!(ids, vec!["0B.3", "0B.1"]);
		assert!(has_more);

		let (ids, has_more) = chain.get_transactions(b"Client 1", 2, 1);
		assert_eq!(ids, vec!["0B.1", "0A.2"]);
		assert!(has_more);

		let (ids, has_more) = chain.get_transactions(b"Client 1", 2, 3);
		assert_eq!(ids, vec!["0A.1"]);
		assert!(!has_more);

		// the fee account only appears in the newest pool
		let (ids, has_more) = chain.get_transactions(b"Fee Accumulator", 999, 0);
		assert_eq!(ids, vec!["0B.4", "0B.2"]);
		assert!(!has_more);

		let (ids, has_more) = chain.get_transactions(b"Client 9", 999, 0);
		assert!(ids.is_empty());
		assert!(!has_more);
	}
	clean_output_dir(dir);
}

#[test]
fn balances_match_after_write_and_after_rebuild() {
	let dir = "test_output/balances_rebuild";
	setup(dir);
	{
		let chain = Chain::init(Some(dir)).unwrap();
		write_sample_chain(&chain);
		// incrementally updated by the write path
		assert_balances(&chain);
	}
	{
		// recomputed from scratch by the startup scan
		let chain = Chain::init(Some(dir)).unwrap();
		assert_balances(&chain);
	}
	clean_output_dir(dir);
}

#[test]
fn transfers_conserve_the_currency_total() {
	let dir = "test_output/conservation";
	setup(dir);
	{
		let chain = Chain::init(Some(dir)).unwrap();
		write_sample_chain(&chain);
		// the two clients only ever trade CS with each other, so their
		// balances cancel out exactly
		let mut total = chain.get_balance(b"Client 1", b"CS").unwrap();
		total.add(chain.get_balance(b"Client 2", b"CS").unwrap());
		assert_eq!(total, Amount::new(0, 0));
	}
	clean_output_dir(dir);
}

#[test]
fn transaction_info_resolves_wire_identifiers() {
	let dir = "test_output/transaction_info";
	setup(dir);
	{
		let chain = Chain::init(Some(dir)).unwrap();
		write_sample_chain(&chain);

		let tx = chain.get_transaction_info("0A.2").unwrap();
		assert_eq!(tx.source_name(), b"Client 2");
		assert_eq!(tx.target_name(), b"Client 1");
		assert_eq!(tx.amount, 50);

		let tx = chain.get_transaction_info("0B.1").unwrap();
		assert_eq!(tx.currency_name(), b"RUB");

		// every mismatch reads as not found
		for bad in &["0A.3", "0A.0", "0A.", "0A", "FF.1", "garbage", ""] {
			let err = chain.get_transaction_info(bad).err().unwrap();
			match err.kind() {
				ErrorKind::NotFound => {}
				k => panic!("unexpected error kind for {:?}: {:?}", bad, k),
			}
		}
	}
	clean_output_dir(dir);
}

#[test]
fn get_pool_reads_back_what_was_written() {
	let dir = "test_output/get_pool";
	setup(dir);
	{
		let chain = Chain::init(Some(dir)).unwrap();

		// nothing written since init
		let err = chain.get_pool(None).err().unwrap();
		match err.kind() {
			ErrorKind::InvalidArgument(_) => {}
			k => panic!("unexpected error kind: {:?}", k),
		}

		write_sample_chain(&chain);

		let pool = chain.get_pool(Some(b"\x0A")).unwrap();
		assert!(pool.header.prev_pool_hash.is_empty());
		assert_eq!(pool.header.sequence, 1);
		assert_eq!(pool.header.transaction_count, 2);
		assert_eq!(pool.transactions.len(), 2);
		assert_eq!(pool.transactions[0].source_name(), b"Client 1");

		// None reads back the most recently written pool
		let pool = chain.get_pool(None).unwrap();
		assert_eq!(pool.header.prev_pool_hash, b"\x0A".to_vec());
		assert_eq!(pool.header.sequence, 2);

		let err = chain.get_pool(Some(b"\x0C")).err().unwrap();
		match err.kind() {
			ErrorKind::NotFound => {}
			k => panic!("unexpected error kind: {:?}", k),
		}
	}
	clean_output_dir(dir);
}
