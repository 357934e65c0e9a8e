//! Polls a set of feeds and posts a webhook notification for every entry published since the
//! last run.

pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod http;
pub mod notify;
pub mod order;
pub mod pipeline;
pub mod watermark;

#[cfg(test)]
mod testing;
