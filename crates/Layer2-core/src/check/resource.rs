//! Resource names sent to the privilege-check service

use crate::error::{AuthzError, Result};

/// Resource covering every space
pub const GLOBAL_RESOURCE: &str = "*";

const SPACE_PREFIX: &str = "space:";

/// Maps space ids to and from `space:<id>` resources
pub struct ResourceSerializer;

impl ResourceSerializer {
    pub fn serialize_space_resource(space_id: &str) -> String {
        format!("{}{}", SPACE_PREFIX, space_id)
    }

    pub fn deserialize_space_resource(resource: &str) -> Result<String> {
        match resource.strip_prefix(SPACE_PREFIX) {
            Some(space_id) if !space_id.is_empty() => Ok(space_id.to_string()),
            _ => Err(AuthzError::InvalidResource(format!(
                "Resource should have started with {}: {}",
                SPACE_PREFIX, resource
            ))),
        }
    }

    pub fn is_space_resource(resource: &str) -> bool {
        resource.starts_with(SPACE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_resource() {
        let resource = ResourceSerializer::serialize_space_resource("marketing");
        assert_eq!(resource, "space:marketing");
        assert!(ResourceSerializer::is_space_resource(&resource));
        assert_eq!(
            ResourceSerializer::deserialize_space_resource(&resource).unwrap(),
            "marketing"
        );
    }

    #[test]
    fn test_invalid_resource() {
        for bad in [GLOBAL_RESOURCE, "marketing", "space:"] {
            let err = ResourceSerializer::deserialize_space_resource(bad).unwrap_err();
            assert!(matches!(err, AuthzError::InvalidResource(_)));
        }
    }
}
