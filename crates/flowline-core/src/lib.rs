//! Flowline Core — domain models, error taxonomy, and repository traits.
//!
//! This crate has no I/O and no database dependency. Storage backends
//! implement the traits in [`repository`]; orchestration lives in
//! `flowline-workflow`.

pub mod error;
pub mod models;
pub mod repository;
