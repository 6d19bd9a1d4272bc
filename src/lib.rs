pub mod config;
pub mod input;
pub mod models;
pub mod output;
pub mod persistence;
pub mod pipeline;
pub mod registry;
pub mod whitelist;

// Re-export commonly used types
pub use config::Config;
pub use models::{Backend, LoginEvent};
pub use input::{LogScanner, ScanError};
pub use persistence::{JournalStore, PersistenceError, SqliteJournal, UsageByIp};
pub use pipeline::{run, PipelineError, RunSummary};
pub use registry::{RegistryLookup, WhoisLookup};
