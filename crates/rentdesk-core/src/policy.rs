//! Authorization policy
//!
//! Pure decision functions. Callers turn a `false` into a rejection.

use rentdesk_auth::AuthUser;
use rentdesk_db::{Property, PropertyType, User, UserRole};

/// Actions subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListUsers,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ViewSummary,
    ListProperties,
    CreateProperty,
    UpdateProperty,
    DeleteProperty,
}

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
const ANY_ROLE: &[UserRole] = &[UserRole::Admin, UserRole::Residential, UserRole::Commercial];

impl Action {
    /// Roles allowed to attempt this action at all
    pub fn permitted_roles(&self) -> &'static [UserRole] {
        match self {
            Action::ListUsers
            | Action::CreateUser
            | Action::UpdateUser
            | Action::DeleteUser
            | Action::ViewSummary => ADMIN_ONLY,
            Action::ListProperties
            | Action::CreateProperty
            | Action::UpdateProperty
            | Action::DeleteProperty => ANY_ROLE,
        }
    }

    /// Whether the action additionally requires ownership of the target
    pub fn requires_ownership(&self) -> bool {
        matches!(self, Action::UpdateProperty | Action::DeleteProperty)
    }
}

/// Decide whether `actor` may perform `action`, optionally on `target`
///
/// Ownership-gated actions without a target are denied.
pub fn can_act(actor: &AuthUser, action: Action, target: Option<&Property>) -> bool {
    if !action.permitted_roles().contains(&actor.role) {
        return false;
    }
    if !action.requires_ownership() || actor.is_admin() {
        return true;
    }
    target.is_some_and(|property| property.created_by == actor.id)
}

/// Self-registration of an admin is only open while none exists
pub fn admin_registration_allowed(existing_admins: i64) -> bool {
    existing_admins == 0
}

/// Admin accounts can never be deleted, whoever asks
pub fn can_delete_user(target: &User) -> bool {
    !target.role.is_admin()
}

/// Only admins may choose or change a listing's type
pub fn can_change_type(actor: &AuthUser) -> bool {
    actor.is_admin()
}

/// Role to listing-type coupling
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyTypePolicy;

impl PropertyTypePolicy {
    /// Type forced on listings created by `role`, if any
    pub fn forced_type(role: UserRole) -> Option<PropertyType> {
        match role {
            UserRole::Residential => Some(PropertyType::Residential),
            UserRole::Commercial => Some(PropertyType::Commercial),
            UserRole::Admin => None,
        }
    }

    /// Type a new listing gets, given the creator's role and the requested type
    pub fn resolve(role: UserRole, requested: Option<PropertyType>) -> PropertyType {
        Self::forced_type(role)
            .or(requested)
            .unwrap_or(PropertyType::Residential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor(id: &str, role: UserRole) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            name: "Actor".to_string(),
            email: format!("{id}@example.com"),
            role,
        }
    }

    fn property_owned_by(owner: &str) -> Property {
        let now = Utc::now();
        Property {
            id: "p1".to_string(),
            title: "Flat".to_string(),
            property_type: PropertyType::Residential,
            location: "Street 1".to_string(),
            area: "Centre".to_string(),
            maps_link: None,
            rent: 1000.0,
            deposit: None,
            features: vec![],
            owner_details: None,
            images: vec!["/uploads/a.jpg".to_string()],
            created_by: owner.to_string(),
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_with_role(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: "u1".to_string(),
            name: "User".to_string(),
            email: "u1@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_may_modify_own_property() {
        let property = property_owned_by("alice");
        for role in [UserRole::Residential, UserRole::Commercial] {
            let alice = actor("alice", role);
            assert!(can_act(&alice, Action::UpdateProperty, Some(&property)));
            assert!(can_act(&alice, Action::DeleteProperty, Some(&property)));
        }
    }

    #[test]
    fn test_non_owner_may_not_modify() {
        let property = property_owned_by("alice");
        for role in [UserRole::Residential, UserRole::Commercial] {
            let bob = actor("bob", role);
            assert!(!can_act(&bob, Action::UpdateProperty, Some(&property)));
            assert!(!can_act(&bob, Action::DeleteProperty, Some(&property)));
        }
    }

    #[test]
    fn test_admin_may_modify_any_property() {
        let property = property_owned_by("alice");
        let admin = actor("root", UserRole::Admin);
        assert!(can_act(&admin, Action::UpdateProperty, Some(&property)));
        assert!(can_act(&admin, Action::DeleteProperty, Some(&property)));
    }

    #[test]
    fn test_ownership_action_without_target_denied() {
        let bob = actor("bob", UserRole::Residential);
        assert!(!can_act(&bob, Action::UpdateProperty, None));
    }

    #[test]
    fn test_admin_only_actions() {
        let admin = actor("root", UserRole::Admin);
        let owner = actor("bob", UserRole::Commercial);
        for action in [
            Action::ListUsers,
            Action::CreateUser,
            Action::UpdateUser,
            Action::DeleteUser,
            Action::ViewSummary,
        ] {
            assert!(can_act(&admin, action, None));
            assert!(!can_act(&owner, action, None));
        }
    }

    #[test]
    fn test_any_role_may_list_and_create_properties() {
        for role in [UserRole::Admin, UserRole::Residential, UserRole::Commercial] {
            let user = actor("someone", role);
            assert!(can_act(&user, Action::ListProperties, None));
            assert!(can_act(&user, Action::CreateProperty, None));
        }
    }

    #[test]
    fn test_admin_registration_only_when_none_exist() {
        assert!(admin_registration_allowed(0));
        assert!(!admin_registration_allowed(1));
        assert!(!admin_registration_allowed(2));
    }

    #[test]
    fn test_admin_never_deletable() {
        assert!(!can_delete_user(&user_with_role(UserRole::Admin)));
        assert!(can_delete_user(&user_with_role(UserRole::Residential)));
        assert!(can_delete_user(&user_with_role(UserRole::Commercial)));
    }

    #[test]
    fn test_type_forced_by_role() {
        assert_eq!(
            PropertyTypePolicy::resolve(UserRole::Residential, Some(PropertyType::Commercial)),
            PropertyType::Residential
        );
        assert_eq!(
            PropertyTypePolicy::resolve(UserRole::Commercial, None),
            PropertyType::Commercial
        );
        assert_eq!(
            PropertyTypePolicy::resolve(UserRole::Admin, Some(PropertyType::Commercial)),
            PropertyType::Commercial
        );
        assert_eq!(
            PropertyTypePolicy::resolve(UserRole::Admin, None),
            PropertyType::Residential
        );
    }

    #[test]
    fn test_only_admin_changes_type() {
        assert!(can_change_type(&actor("root", UserRole::Admin)));
        assert!(!can_change_type(&actor("bob", UserRole::Residential)));
        assert!(!can_change_type(&actor("eve", UserRole::Commercial)));
    }
}
