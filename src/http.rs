//! HTTP helpers for retrieving key sets from upstream publishers.

pub mod client;
