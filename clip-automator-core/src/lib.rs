#![doc = "clip-automator-core: core logic library for clip-automator."]

//! Drive upload workflow, batch downloads through an external tool,
//! platform credential checks and highlight fetchers.
//!
//! Everything that talks to a network service or another program goes
//! through a trait in [`contract`], so the workflows can be exercised with
//! the generated mocks.

pub mod config;
pub mod contract;
pub mod credentials;
pub mod download;
pub mod drive_query;
pub mod fetchers;
pub mod google_drive;
pub mod upload;
