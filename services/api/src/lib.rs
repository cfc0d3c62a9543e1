//! services/api/src/lib.rs
//!
//! HTTP host for the recall scheduling core: configuration, the PostgreSQL
//! repository adapter and the REST surface.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
