//! Bot/campaign scheduling engine for programmatic on-chain trading swarms.
//!
//! The domain model and application services are runtime-agnostic: every
//! external dependency (persistence, signing, execution, balances, pool
//! state) is consumed through a port in `domain::ports`, satisfied here by
//! the SQLite and HTTP adapters under `adapters`.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
