use v4vision_auth::{Identity, User};

/// The caller of a request, reloaded from the user store on every request.
///
/// Inserted by the auth middleware; every protected handler takes it as an
/// extension and passes [`CallerContext::identity`] to the authorization and
/// scoping calls explicitly.
#[derive(Debug, Clone)]
pub struct CallerContext {
    user: User,
    identity: Identity,
}

impl CallerContext {
    pub fn new(user: User) -> Self {
        let identity = Identity::from(&user);
        Self { user, identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
