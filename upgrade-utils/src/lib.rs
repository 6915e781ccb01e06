//! Test utilities for the upgrade pipeline: an in-memory chain client and
//! canned artifact fixtures.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod fixtures;
pub mod mock_chain;
