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

//! Error types for the chain
use failure::{Backtrace, Context, Fail};
use std::fmt::{self, Display};
use std::io;

use poolchain_core::ser;
use poolchain_store as store;

/// Error definition
#[derive(Debug, Fail)]
pub struct Error {
	inner: Context<ErrorKind>,
}

/// Chain error definitions
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
	/// A caller-supplied argument was unusable
	#[fail(display = "invalid argument: {}", _0)]
	InvalidArgument(String),
	/// A pool with this hash is already stored; pools are immutable
	#[fail(display = "pool already exists: {}", _0)]
	AlreadyExists(String),
	/// Pool, transaction or account not present
	#[fail(display = "not found")]
	NotFound,
	/// A stored record failed to decode
	#[fail(display = "corrupt record: {}", _0)]
	Corrupt(String),
	/// The stored pools do not resolve to exactly one rooted chain
	#[fail(display = "chain broken: {}", _0)]
	ChainBroken(String),
	/// Internal issue when trying to save or load data from store
	#[fail(display = "store error: {}", _1)]
	StoreErr(store::Error, String),
	/// Error serializing or deserializing a type
	#[fail(display = "serialization error")]
	SerErr(ser::Error),
	/// Anything else
	#[fail(display = "other error: {}", _0)]
	Other(String),
}

impl Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let cause = match self.cause() {
			Some(c) => format!("{}", c),
			None => String::from("Unknown"),
		};
		let output = format!("{} \n Cause: {}", self.inner, cause);
		Display::fmt(&output, f)
	}
}

impl Error {
	/// get kind
	pub fn kind(&self) -> ErrorKind {
		self.inner.get_context().clone()
	}
	/// get cause
	pub fn cause(&self) -> Option<&dyn Fail> {
		self.inner.cause()
	}
	/// get backtrace
	pub fn backtrace(&self) -> Option<&Backtrace> {
		self.inner.backtrace()
	}
	/// Whether this is a plain miss rather than a real failure
	pub fn is_not_found(&self) -> bool {
		self.kind() == ErrorKind::NotFound
	}
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Error {
		Error {
			inner: Context::new(kind),
		}
	}
}

impl From<Context<ErrorKind>> for Error {
	fn from(inner: Context<ErrorKind>) -> Error {
		Error { inner }
	}
}

impl From<store::Error> for Error {
	fn from(error: store::Error) -> Error {
		match error {
			store::Error::NotFoundErr(_) => Error {
				inner: Context::new(ErrorKind::NotFound),
			},
			_ => {
				let ec = error.clone();
				Error {
					inner: error.context(ErrorKind::StoreErr(ec.clone(), format!("{}", ec))),
				}
			}
		}
	}
}

impl From<ser::Error> for Error {
	fn from(error: ser::Error) -> Error {
		Error {
			inner: Context::new(ErrorKind::SerErr(error)),
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error {
			inner: Context::new(ErrorKind::Other(e.to_string())),
		}
	}
}
