//! Core data model types for recipients and contacts.

pub mod address;
pub mod contact;
