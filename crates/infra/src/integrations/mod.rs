//! External service integrations

pub mod bc;
pub mod mailchimp;
