//! Mapping from customer records to Mailchimp member fields

use bcsync_domain::{split_display_name, Customer, MergeFields};
use md5::{Digest, Md5};

/// Mailchimp member identifier: lowercase hex MD5 of the trimmed,
/// lowercased email address.
pub fn subscriber_hash(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Md5::digest(normalized.as_bytes());
    hex::encode(digest)
}

/// Build the merge-field payload for a customer.
///
/// The display name is split into first/last for FNAME and LNAME while the
/// full name goes into COMPANY, matching how Business Central stores both
/// person and company customers in a single field.
pub fn merge_fields(customer: &Customer) -> MergeFields {
    let (first_name, last_name) = split_display_name(&customer.display_name);

    MergeFields {
        first_name,
        last_name,
        phone: customer.phone_number.clone().unwrap_or_default(),
        company: customer.display_name.clone(),
        address: customer.address_line1.clone().unwrap_or_default(),
        city: customer.city.clone().unwrap_or_default(),
        state: customer.state.clone().unwrap_or_default(),
        zip: customer.postal_code.clone().unwrap_or_default(),
        country: customer.country.clone().unwrap_or_default(),
        bc_id: customer.id.clone(),
        bc_number: customer.number.clone(),
    }
}
