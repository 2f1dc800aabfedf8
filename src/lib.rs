pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod links;
pub mod media;
pub mod pipeline;
pub mod storage;
pub mod uploader;

pub use cli::{run, Cli};
