pub mod config;
pub mod credentials;
pub mod digest;
pub mod filter;
pub mod lister;
pub mod logging;
pub mod ratelimit;
pub mod report;
pub mod slack;
pub mod summarize;
pub mod thread;

pub fn work_dir() -> anyhow::Result<std::path::PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

use anyhow::Context;
