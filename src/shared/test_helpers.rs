#[cfg(test)]
use crate::features::auth::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, Router};

#[cfg(test)]
pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "test-admin".to_string(),
        roles: vec!["administrator".to_string()],
    }
}

/// Inject a fixed user into every request, standing in for the auth middleware
#[cfg(test)]
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

#[cfg(test)]
pub fn with_admin_auth(router: Router) -> Router {
    with_user(router, create_admin_user())
}

#[cfg(test)]
pub fn with_user_auth(router: Router, roles: &[&str]) -> Router {
    with_user(
        router,
        AuthenticatedUser {
            user_id: "test-user".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        },
    )
}
