//! This crate rexports all kademlia crates.

pub use kad_binary_io as binary_io;
pub use kad_core as core;
pub use kad_id as id;
pub use kad_packet as packet;

/// The kademlia crate version string in the form "major.minor.patch" (e.g. "1.2.3")
pub fn crate_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
/// The kademlia crate major version represented as unsigned integer
pub fn crate_version_major() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().expect("Invalid major version")
}
/// The kademlia crate minor version represented as unsigned integer
pub fn crate_version_minor() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().expect("Invalid minor version")
}
/// The kademlia crate patch version represented as unsigned integer
pub fn crate_version_patch() -> u32 {
    env!("CARGO_PKG_VERSION_PATCH").parse().expect("Invalid patch version")
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_version_is_not_empty() {
        assert_ne!(crate::crate_version(), "");
    }

    #[test]
    fn crate_version_parts() {
        let version = format!(
            "{}.{}.{}",
            crate::crate_version_major(),
            crate::crate_version_minor(),
            crate::crate_version_patch(),
        );
        assert!(crate::crate_version().starts_with(&version));
    }

    #[test]
    fn reexports_are_usable() {
        let local_id = crate::id::Id::from([0; crate::id::ID_SIZE]);
        let table = crate::core::routing_table::RoutingTable::new(local_id);
        let packet = crate::packet::Packet::FindPeersRequest(crate::packet::FindPeersRequest { target: local_id });

        assert!(table.is_empty());
        assert!(!packet.is_response());
    }
}
