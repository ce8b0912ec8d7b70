#![doc = include_str!("../README.md")]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod page;
pub mod tools;
pub mod types;

#[cfg(test)]
mod testing;
mod tests;

pub use config::Config;
pub use engine::*;
pub use error::{FetchError, PageLookup, Result, TransportError};
pub use page::FetchedPage;
pub use tools::document::ElementSnapshot;
pub use tools::fetch::{RawResponse, ReqwestTransport, Transport, TransportRequest};
pub use types::*;
