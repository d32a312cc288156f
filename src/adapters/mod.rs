// Concrete implementations of the domain ports.

pub mod audit_log;
pub mod catalog;
pub mod fs;
pub mod prompter;

pub use audit_log::{AuditRecord, InMemoryAuditLog, JsonLinesAuditLog};
pub use catalog::CatalogStore;
pub use fs::LocalFileReader;
pub use prompter::StdinPrompter;
