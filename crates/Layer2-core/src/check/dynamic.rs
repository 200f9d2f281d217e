//! Space-aware dispatch of privilege checks

use super::client::CheckPrivileges;
use super::types::CheckPrivilegesResponse;
use crate::error::Result;

/// Checks at the request's space, or globally when spaces are disabled
#[derive(Clone)]
pub struct CheckPrivilegesDynamically {
    checker: CheckPrivileges,
    spaces_enabled: bool,
}

impl CheckPrivilegesDynamically {
    pub fn new(checker: CheckPrivileges, spaces_enabled: bool) -> Self {
        Self {
            checker,
            spaces_enabled,
        }
    }

    pub fn checker(&self) -> &CheckPrivileges {
        &self.checker
    }

    pub fn spaces_enabled(&self) -> bool {
        self.spaces_enabled
    }

    pub async fn check(
        &self,
        privileges: &[String],
        cluster_privileges: &[String],
    ) -> Result<CheckPrivilegesResponse> {
        if self.spaces_enabled {
            let space_id = self.checker.context().space_id.clone();
            self.checker
                .at_space(&space_id, privileges, cluster_privileges)
                .await
        } else {
            self.checker.globally(privileges, cluster_privileges).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckPrivilegesFactory, RequestContext};
    use crate::testing::GrantingTransport;
    use std::sync::Arc;
    use tessera_foundation::Actions;

    #[tokio::test]
    async fn test_dispatch_by_spaces_flag() {
        let transport = Arc::new(GrantingTransport::new("elastic"));
        let factory = CheckPrivilegesFactory::new("app", Actions::new("1.0.0"), transport.clone());
        let privileges = vec!["api:read".to_string()];

        let checker = factory.with_request(RequestContext::new("marketing"));
        CheckPrivilegesDynamically::new(checker.clone(), true)
            .check(&privileges, &[])
            .await
            .unwrap();
        CheckPrivilegesDynamically::new(checker, false)
            .check(&privileges, &[])
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].application[0].resources, vec!["space:marketing"]);
        assert_eq!(requests[1].application[0].resources, vec!["*"]);
    }
}
