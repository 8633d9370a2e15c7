//! Authenticated-identity extraction.
//!
//! Token verification happens upstream at the gateway, which forwards the
//! validated identity in headers. This service only reads them; it never
//! issues or verifies tokens.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use flowcart_commerce::UserId;

use crate::envelope::AppError;

/// Header carrying the validated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the validated role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Merchant,
    Admin,
    WarehouseStaff,
    Courier,
}

impl Role {
    /// Parse a role header value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Role::Customer),
            "merchant" => Some(Role::Merchant),
            "admin" => Some(Role::Admin),
            "warehouse_staff" => Some(Role::WarehouseStaff),
            "courier" => Some(Role::Courier),
            _ => None,
        }
    }

    /// Whether the role may act on merchant resources.
    pub fn is_merchant_or_admin(&self) -> bool {
        matches!(self, Role::Merchant | Role::Admin)
    }
}

/// The identity attached to an incoming request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Role::parse)
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id: UserId::new(user_id),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("merchant"), Some(Role::Merchant));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("warehouse_staff"), Some(Role::WarehouseStaff));
        assert_eq!(Role::parse("courier"), Some(Role::Courier));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_merchant_or_admin() {
        assert!(Role::Merchant.is_merchant_or_admin());
        assert!(Role::Admin.is_merchant_or_admin());
        assert!(!Role::Customer.is_merchant_or_admin());
        assert!(!Role::Courier.is_merchant_or_admin());
    }
}
