pub mod error;
pub mod logging;

// Pure rules: node derivation, flag sets, initial sound law
pub mod node;
pub mod flags;
pub mod hangul;

// Engine: node cache, batch jobs, resolution
pub mod node_index;
pub mod dictionary;
pub mod batch;
pub mod resolver;
pub mod integrity;
pub mod session;

// Online existence oracle
pub mod verify;

pub use dictionary::{Dictionary, DictionaryStats, NodeMark};
pub use error::{Error, Result};
