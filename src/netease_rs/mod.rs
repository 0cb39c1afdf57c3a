//! Minimal client for the NetEase Cloud Music web API.
//!
//! Only the two endpoints needed to snapshot a public playlist are covered:
//! playlist detail (name + track ids) and batched song detail.

pub mod client;
pub mod types;

pub use client::{NeteaseClient, NeteaseClientConfig};
