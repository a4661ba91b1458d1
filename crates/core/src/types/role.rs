//! Session roles.

use serde::{Deserialize, Serialize};

/// Role attached to the ambient session.
///
/// Admins may view another customer's cart read-only; everything else in the
/// cart engine treats the two roles identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Shop administrator.
    Admin,
    /// Regular customer.
    #[default]
    Customer,
}

impl Role {
    /// Whether this role grants the admin impersonation view.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Customer.is_admin());
    }
}
