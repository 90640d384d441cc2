#![deny(dead_code)]
#![deny(unused_variables)]

pub mod chunker;
pub mod clean;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{ChunkRecord, SearchHit};
