pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod query;
pub mod session;
pub mod storage;

pub use error::{Result, SearchError};
pub use config::Config;
pub use query::Dork;
pub use session::{SearchSession, SessionConfig};
pub use storage::{ExportFormat, Exporter};
