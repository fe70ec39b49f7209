use tracing::info;
use webchat_shared::Client;

/// Grow-only list of registered clients. Duplicate entries are allowed:
/// registering the same or a different name from one address always adds a
/// new record.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<Client>,
}

impl ClientRegistry {
    pub fn add(&mut self, client: Client) {
        info!(name = %client.name, address = %client.address, "Added client");
        self.clients.push(client);
    }

    /// True iff some client matches both `address` and `name` exactly.
    pub fn find(&self, address: &str, name: &str) -> bool {
        self.clients.iter().any(|c| c.matches(address, name))
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}
