use uuid::Uuid;

/// Identity of the caller of a protected route
///
/// Inserted into the request extensions by `AuthMiddleware` once the access
/// token verified and the user exists; read by handlers through
/// `web::ReqData<SessionIdentity>`. Lives only as long as the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
}

impl SessionIdentity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
