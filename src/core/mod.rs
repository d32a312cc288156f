pub mod auditor;
pub mod bus;
pub mod commands;
pub mod response;
pub mod validation;

pub use auditor::{AuditEntry, AuditHandle, AuditableAction, Auditor};
pub use bus::CommandBus;
pub use commands::Command;
pub use response::{Action, AuditSubject, CommandResponse};
pub use validation::{Predicate, Rule, Rules, ValidationError, Validator};
