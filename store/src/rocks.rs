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

//! RocksDB-backed store facilitating data access and serialization.
//! Multi-key writes go through a Batch abstraction providing atomicity.

use rocksdb::{DBIterator, IteratorMode, Options, WriteBatch, DB};

use poolchain_core::ser;

/// Main error type for the store.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
	/// Couldn't find what we were looking for
	#[fail(display = "db not found error: {}", _0)]
	NotFoundErr(String),
	/// Wraps an error originating from RocksDB (which unfortunately
	/// returns string errors).
	#[fail(display = "rocksdb error: {}", _0)]
	RocksDbErr(String),
	/// Wraps a serialization error for Writeable or Readable
	#[fail(display = "serialization error: {}", _0)]
	SerErr(ser::Error),
}

impl From<rocksdb::Error> for Error {
	fn from(e: rocksdb::Error) -> Error {
		Error::RocksDbErr(e.to_string())
	}
}

/// unwraps the inner option by converting the none case to a not found
/// error
pub fn option_to_not_found<T>(res: Result<Option<T>, Error>, field_name: &str) -> Result<T, Error> {
	match res {
		Ok(None) => Err(Error::NotFoundErr(field_name.to_owned())),
		Ok(Some(o)) => Ok(o),
		Err(e) => Err(e),
	}
}

/// RocksDB wrapper, providing point reads and writes, atomic batched
/// writes and ordered iteration by key.
pub struct Store {
	db: DB,
}

impl Store {
	/// Opens a store at the provided path, creating it if missing.
	pub fn open(path: &str) -> Result<Store, Error> {
		let mut opts = Options::default();
		opts.create_if_missing(true);
		let db = DB::open(&opts, path)?;
		Ok(Store { db })
	}

	/// Creates a store at the provided path; the path must not already
	/// hold one.
	pub fn create_new(path: &str) -> Result<Store, Error> {
		let mut opts = Options::default();
		opts.create_if_missing(true);
		opts.set_error_if_exists(true);
		let db = DB::open(&opts, path)?;
		Ok(Store { db })
	}

	/// Destroys the store files under the provided path. Used for
	/// derived stores that are rebuilt from scratch rather than kept.
	pub fn destroy(path: &str) -> Result<(), Error> {
		debug!("destroying store at {}", path);
		DB::destroy(&Options::default(), path).map_err(From::from)
	}

	/// Gets a value from the db, provided its key
	pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
		self.db.get(key).map_err(From::from)
	}

	/// Gets a `Readable` value from the db, provided its key.
	/// Encapsulates serialization.
	pub fn get_ser<T: ser::Readable>(&self, key: &[u8]) -> Result<Option<T>, Error> {
		match self.get(key)? {
			Some(value) => ser::deserialize(&value).map(Some).map_err(Error::SerErr),
			None => Ok(None),
		}
	}

	/// Whether the provided key exists
	pub fn exists(&self, key: &[u8]) -> Result<bool, Error> {
		self.db
			.get_pinned(key)
			.map(|r| r.is_some())
			.map_err(From::from)
	}

	/// Writes a single key/value pair to the db
	pub fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), Error> {
		self.db.put(key, value).map_err(From::from)
	}

	/// Writes a single key and its `Writeable` value to the db.
	/// Encapsulates serialization.
	pub fn put_ser<W: ser::Writeable>(&self, key: &[u8], value: &W) -> Result<(), Error> {
		let data = ser::ser_vec(value).map_err(Error::SerErr)?;
		self.put(key, data)
	}

	/// Whether the store holds no entries at all.
	pub fn is_empty(&self) -> Result<bool, Error> {
		let mut iter = self.db.iterator(IteratorMode::Start);
		match iter.next() {
			Some(Ok(_)) => Ok(false),
			Some(Err(e)) => Err(From::from(e)),
			None => Ok(true),
		}
	}

	/// Ordered iteration over every (key, value) pair in the store, by
	/// key.
	pub fn iter(&self) -> RawIterator<'_> {
		RawIterator {
			iter: self.db.iterator(IteratorMode::Start),
		}
	}

	/// Builds a new batch to be used with this store.
	pub fn batch(&self) -> Batch<'_> {
		Batch {
			store: self,
			batch: WriteBatch::default(),
		}
	}

	fn write(&self, batch: WriteBatch) -> Result<(), Error> {
		self.db.write(batch).map_err(From::from)
	}
}

/// Batch to write multiple Writeables to the db in an atomic manner.
pub struct Batch<'a> {
	store: &'a Store,
	batch: WriteBatch,
}

impl<'a> Batch<'a> {
	/// Queues a single key/value pair write. The commit function must
	/// be called to write the batch to storage.
	pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
		self.batch.put(key, value);
	}

	/// Queues a single key and its `Writeable` value. Encapsulates
	/// serialization.
	pub fn put_ser<W: ser::Writeable>(&mut self, key: &[u8], value: &W) -> Result<(), Error> {
		let data = ser::ser_vec(value).map_err(Error::SerErr)?;
		self.batch.put(key, data);
		Ok(())
	}

	/// Atomically writes every queued operation to the db.
	pub fn commit(self) -> Result<(), Error> {
		self.store.write(self.batch)
	}
}

/// An iterator over the raw (key, value) pairs of a store, in key
/// order.
pub struct RawIterator<'a> {
	iter: DBIterator<'a>,
}

impl<'a> Iterator for RawIterator<'a> {
	type Item = Result<(Box<[u8]>, Box<[u8]>), Error>;

	fn next(&mut self) -> Option<Self::Item> {
		self.iter.next().map(|r| r.map_err(From::from))
	}
}
