//! Common modules used throughout the project, including the orchestration
//! pipeline & testing code

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod backends;
pub mod constants;
pub mod types;
