#![doc = "events-sync-core: core logic library for events-sync."]

//! This crate holds the incremental sync pipeline for the council events feed:
//! slug generation, record normalisation, dedup-insert, pagination and the
//! orchestrating `synchronise` entrypoint. Persistence is reached only through
//! the [`contract::EventStore`] trait so the pipeline can run against SQLite,
//! an in-memory store or a mock.
//!
//! # Usage
//! Depend on this crate from binaries that provide a concrete store, and build
//! an [`fetch::HttpEventSource`] for the upstream API.

pub mod config;
pub mod contract;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod normalize;
pub mod paginate;
pub mod record;
pub mod slug;
pub mod synchronise;
