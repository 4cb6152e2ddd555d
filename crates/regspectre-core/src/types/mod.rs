mod config;
mod finding;
mod provider;
mod result;
mod snapshot;

pub use config::*;
pub use finding::*;
pub use provider::*;
pub use result::*;
pub use snapshot::*;
