//! Mailchimp marketing API integration

pub mod client;
pub mod map;

pub use client::MailchimpClient;
pub use map::{merge_fields, subscriber_hash};
