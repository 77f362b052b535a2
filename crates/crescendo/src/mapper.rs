//! Request mapper collaborator: translates external identifiers into
//! request names.
//!
//! The default mapping is the identity; web hosts typically plug in a
//! mapper that strips path prefixes or consults a routing table. When a
//! mapped name has no registered request, the dispatcher maps the literal
//! [`NOT_FOUND_REQUEST`] through the same mapper before giving up.

/// Request name the dispatcher falls back to when a lookup fails.
pub const NOT_FOUND_REQUEST: &str = "404";

/// Contract for mapping external identifiers to request names.
pub trait RequestMapper: Send + Sync {
    /// Maps an external identifier (typically a URI or CLI argument) to the
    /// name of a registered request. The default implementation is the
    /// identity.
    fn uri_to_request(&self, identifier: &str) -> String {
        identifier.to_owned()
    }
}

/// The default mapper: every identifier is already a request name.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl RequestMapper for IdentityMapper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapper_passes_names_through() {
        assert_eq!(IdentityMapper.uri_to_request("front"), "front");
        assert_eq!(IdentityMapper.uri_to_request("404"), NOT_FOUND_REQUEST);
    }

    #[test]
    fn custom_mapper_overrides_the_default() {
        struct Remapper;
        impl RequestMapper for Remapper {
            fn uri_to_request(&self, identifier: &str) -> String {
                if identifier == "NonExistentRequestName" {
                    "testHandleRequest2".to_owned()
                } else {
                    identifier.to_owned()
                }
            }
        }

        assert_eq!(
            Remapper.uri_to_request("NonExistentRequestName"),
            "testHandleRequest2"
        );
        assert_eq!(Remapper.uri_to_request("front"), "front");
    }
}
