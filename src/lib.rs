//! `mailto` — compose email to contacts from a launcher search box.
//!
//! This crate provides the core library for turning typed recipient queries
//! into contact suggestions, and recipient lists into `mailto:` URIs that
//! each email client understands.

pub mod apps;
pub mod compose;
pub mod config;
pub mod contacts;
pub mod error;
pub mod format;
pub mod launch;
pub mod model;
pub mod search;
pub mod settings;
