//! Token acquisition for the Business Central API

pub mod entra;

pub use entra::EntraTokenProvider;
