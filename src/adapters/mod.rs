//! Concrete adapters implementing the orchestrator's domain ports
//! (spec §6): SQLite persistence and HTTP collaborator clients.

pub mod http;
pub mod sqlite;
