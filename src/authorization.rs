/// Authorization Policy
///
/// Pure checks on an authenticated caller. Two policies exist and they are
/// deliberately not the same:
/// - reviews: the author or any admin may act
/// - orders: only the buyer may read, admins included in the refusal

use uuid::Uuid;

use crate::domain::Role;
use crate::error::{AppError, AppResult};

/// The authenticated identity of a request, as carried by its access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        is_admin(self.role)
    }
}

pub fn is_admin(role: Role) -> bool {
    role == Role::Admin
}

pub fn is_owner_or_admin(owner_id: Uuid, caller: &Caller) -> bool {
    owner_id == caller.user_id || caller.is_admin()
}

/// # Errors
/// Forbidden with `message` unless the caller owns the resource or is an admin
pub fn ensure_owner_or_admin(owner_id: Uuid, caller: &Caller, message: &str) -> AppResult<()> {
    if is_owner_or_admin(owner_id, caller) {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

/// # Errors
/// Forbidden with `message` unless the caller owns the resource; role is ignored
pub fn ensure_owner(owner_id: Uuid, caller: &Caller, message: &str) -> AppResult<()> {
    if owner_id == caller.user_id {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

/// # Errors
/// Forbidden unless the caller holds `role`
pub fn ensure_role(caller: &Caller, role: Role) -> AppResult<()> {
    if caller.role == role {
        Ok(())
    } else {
        Err(AppError::forbidden("Forbidden"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn owner_passes_both_policies() {
        let me = caller(Role::User);
        assert!(ensure_owner_or_admin(me.user_id, &me, "Not allowed").is_ok());
        assert!(ensure_owner(me.user_id, &me, "Not allowed").is_ok());
    }

    #[test]
    fn admin_overrides_review_policy_only() {
        let admin = caller(Role::Admin);
        let someone_else = Uuid::new_v4();

        assert!(ensure_owner_or_admin(someone_else, &admin, "Not allowed").is_ok());
        assert!(matches!(
            ensure_owner(someone_else, &admin, "Not allowed"),
            Err(AppError::Auth(AuthError::Forbidden(_)))
        ));
    }

    #[test]
    fn stranger_is_refused_with_given_message() {
        let stranger = caller(Role::User);
        let err = ensure_owner_or_admin(Uuid::new_v4(), &stranger, "Not allowed").unwrap_err();
        assert_eq!(err.to_string(), "Not allowed");
    }

    #[test]
    fn role_check() {
        assert!(ensure_role(&caller(Role::Admin), Role::Admin).is_ok());
        assert!(ensure_role(&caller(Role::User), Role::Admin).is_err());
        assert!(is_admin(Role::Admin));
        assert!(!is_admin(Role::User));
    }
}
