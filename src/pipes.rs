use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Logical function of a physical bulk endpoint, learned from a Pipe Usage
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeRole {
    Command,
    Status,
    DataIn,
    DataOut,
}

impl PipeRole {
    /// Pipe ID byte from the Pipe Usage descriptor.
    pub fn from_pipe_id(id: u8) -> Option<PipeRole> {
        match id {
            0x01 => Some(PipeRole::Command),
            0x02 => Some(PipeRole::Status),
            0x03 => Some(PipeRole::DataIn),
            0x04 => Some(PipeRole::DataOut),
            _ => None,
        }
    }
}

impl fmt::Display for PipeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeRole::Command => write!(f, "Command"),
            PipeRole::Status => write!(f, "Status"),
            PipeRole::DataIn => write!(f, "Data-In"),
            PipeRole::DataOut => write!(f, "Data-Out"),
        }
    }
}

/// Endpoint-to-role map for one session. Roles are learned once from pipe
/// usage descriptors; traffic on an endpoint with no learned role decodes
/// as unclassified bulk data.
#[derive(Debug, Default)]
pub struct PipeResolver {
    roles: HashMap<u8, PipeRole>,
}

impl PipeResolver {
    pub fn new() -> Self {
        PipeResolver::default()
    }

    pub fn learn_pipe_usage(&mut self, endpoint: u8, role: PipeRole) {
        debug!("endpoint 0x{:02X} carries {} pipe", endpoint, role);
        self.roles.insert(endpoint, role);
    }

    pub fn resolve(&self, endpoint: u8) -> Option<PipeRole> {
        self.roles.get(&endpoint).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlearned_endpoint_resolves_to_none() {
        let resolver = PipeResolver::new();
        assert_eq!(resolver.resolve(0x81), None);
    }

    #[test]
    fn learned_roles_resolve() {
        let mut resolver = PipeResolver::new();
        resolver.learn_pipe_usage(0x02, PipeRole::Command);
        resolver.learn_pipe_usage(0x81, PipeRole::Status);
        assert_eq!(resolver.resolve(0x02), Some(PipeRole::Command));
        assert_eq!(resolver.resolve(0x81), Some(PipeRole::Status));
    }

    #[test]
    fn pipe_id_byte_mapping() {
        assert_eq!(PipeRole::from_pipe_id(0x01), Some(PipeRole::Command));
        assert_eq!(PipeRole::from_pipe_id(0x04), Some(PipeRole::DataOut));
        assert_eq!(PipeRole::from_pipe_id(0x05), None);
        assert_eq!(PipeRole::from_pipe_id(0x00), None);
    }
}
