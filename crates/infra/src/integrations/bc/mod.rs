//! Business Central API integration

pub mod client;

pub use client::{AccessTokenProvider, BcClient};
