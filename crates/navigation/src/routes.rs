//! Portal route paths.

pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/foursyz/dashboard";
pub const CREATE_USER: &str = "/foursyz/create_user4syz";
pub const CLIENT_DETAILS: &str = "/foursyz/client_details";
pub const DELIVERY_CHALLAN_TRACKER: &str = "/foursyz/delivery_challan_tracker";
pub const POLICY_MANAGEMENT: &str = "/foursyz/policy_management";

/// Strip query string and fragment from a route.
pub fn route_path(route: &str) -> &str {
    let end = route.find(['?', '#']).unwrap_or(route.len());
    &route[..end]
}

/// True when `prefix` governs `path`: equal, or a prefix ending at a `/` boundary.
pub fn governs(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || !prefix.starts_with('/') {
        return false;
    }
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_end_matches('/');
    if prefix.is_empty() {
        return path.is_empty();
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(route_path("/foursyz/client_details?id=4#top"), "/foursyz/client_details");
        assert_eq!(route_path("/login#"), "/login");
        assert_eq!(route_path("/plain"), "/plain");
    }

    #[test]
    fn prefixes_match_on_segment_boundaries() {
        assert!(governs(CLIENT_DETAILS, "/foursyz/client_details"));
        assert!(governs(CLIENT_DETAILS, "/foursyz/client_details/17/edit"));
        assert!(governs(CLIENT_DETAILS, "/foursyz/client_details/"));
        assert!(!governs(CLIENT_DETAILS, "/foursyz/client_details_archive"));
        assert!(!governs("#", "/foursyz/dashboard"));
    }
}
