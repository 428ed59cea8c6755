//! Run orchestration for the release notes bot.
//!
//! This crate ties together fetching, extraction, markdown rendering, the
//! posted-key ledger and a [`releasebot_publisher::Publisher`] into a single
//! run (see [`pipeline::run`]).

pub mod pipeline;
pub mod report;
