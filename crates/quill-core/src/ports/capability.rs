//! Authorization port.

use crate::domain::{Actor, Role};

/// Something an actor may or may not be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create, edit, publish or delete any post regardless of authorship.
    EditAllContent,
    /// Approve, reject or delete comments.
    ModerateComments,
    /// Maintain categories and tags.
    ManageTaxonomy,
}

/// Capability check injected into services.
pub trait CapabilityChecker: Send + Sync {
    fn can(&self, actor: &Actor, action: Action) -> bool;
}

/// Role-based capabilities: admins and editors may do everything, authors only
/// touch their own posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCapabilities;

impl CapabilityChecker for RoleCapabilities {
    fn can(&self, actor: &Actor, _action: Action) -> bool {
        matches!(actor.role, Role::Admin | Role::Editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_only_admins_and_editors_edit_all() {
        let checker = RoleCapabilities;
        let id = Uuid::new_v4();
        assert!(checker.can(&Actor::new(id, Role::Admin), Action::EditAllContent));
        assert!(checker.can(&Actor::new(id, Role::Editor), Action::ModerateComments));
        assert!(!checker.can(&Actor::new(id, Role::Author), Action::EditAllContent));
        assert!(!checker.can(&Actor::new(id, Role::Author), Action::ManageTaxonomy));
    }
}
