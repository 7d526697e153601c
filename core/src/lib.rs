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

//! Core record types of the transaction-chain store and the binary
//! serialization layer their frozen on-disk formats are built on.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate serde_derive;

pub mod amount;
pub mod pool;
pub mod ser;
pub mod transaction;

pub use crate::amount::{Amount, AMOUNT_MAX_FRACTION};
pub use crate::pool::{Pool, PoolHeader};
pub use crate::transaction::{uuid_to_string, Transaction, ACCOUNT_LEN, TRANSACTION_SIZE};
