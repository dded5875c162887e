//! Pure domain helpers

pub mod name;
