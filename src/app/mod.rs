#[cfg(feature = "cli")]
pub mod runner;
pub mod services;

pub use services::ServiceBuilder;
