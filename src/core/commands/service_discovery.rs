use crate::domain::model::ServiceDiscovery;
use crate::domain::status::Status;

/// Serves the registry protocol's discovery document. Not audited.
#[derive(Debug, Clone, Default)]
pub struct ServiceDiscoveryCommand {
    document: ServiceDiscovery,
}

impl ServiceDiscoveryCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> (Status, ServiceDiscovery) {
        (Status::Okay, self.document.clone())
    }
}
