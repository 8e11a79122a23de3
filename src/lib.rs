//! keymatch - resolve a short query to the best-matching record in a sorted
//! key-value store.
//!
//! A query is widened into a few uppercase prefixes ([`terms`]), each of
//! which drives one prefix scan over the store ([`store`]). Every visited
//! key is scored against the original query ([`scoring`]), duplicates are
//! collapsed to their best score, and the single highest-scoring record
//! wins ([`search`]).
//!
//! # Quick start
//!
//! ```no_run
//! use keymatch::{DataDir, RedbStore};
//! use keymatch::search::{self, Match, Query};
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let store = RedbStore::open(&data_dir.store(None), "records").unwrap();
//!
//! let query = Query::parse("app+pie").unwrap();
//! match search::search(&store, &query) {
//!     Match::Found(best) => println!("{} -> {}", best.key, best.value),
//!     Match::NotFound => println!("no match"),
//! }
//! ```

pub mod data_dir;
pub mod error;
pub mod scoring;
pub mod search;
pub mod store;
pub mod terms;

pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use search::{Candidate, Match, Query};
pub use store::{KeyStore, MemoryStore, RedbStore};
