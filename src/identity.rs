//! Resolves who is making a request. The only distinction the blog makes is
//! whether the caller is an administrator, which decides whether templates
//! show edit links and a logout link.

use actix_web::HttpRequest;

/// The name of the cookie [`TokenIdentity`] reads.
pub const ADMIN_COOKIE: &str = "admin_token";

/// An authenticated administrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admin {
    /// Where the template's logout link points.
    pub logout_url: String,
}

/// Decides, once per request, whether the caller is an administrator.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, req: &HttpRequest) -> Option<Admin>;

    /// Whether the routes that create or edit content are limited to callers
    /// [`IdentityProvider::resolve`] recognizes as administrators.
    fn guards_writes(&self) -> bool {
        false
    }
}

/// Treats nobody as an administrator.
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn resolve(&self, _req: &HttpRequest) -> Option<Admin> {
        None
    }
}

/// Treats a request as coming from an administrator when it carries an
/// [`ADMIN_COOKIE`] cookie equal to the configured token.
pub struct TokenIdentity {
    token: String,
    logout_url: String,
}

impl TokenIdentity {
    pub fn new(token: String, logout_url: String) -> TokenIdentity {
        TokenIdentity { token, logout_url }
    }
}

impl IdentityProvider for TokenIdentity {
    fn resolve(&self, req: &HttpRequest) -> Option<Admin> {
        let cookie = req.cookie(ADMIN_COOKIE)?;
        if !self.token.is_empty() && cookie.value() == self.token {
            Some(Admin {
                logout_url: self.logout_url.clone(),
            })
        } else {
            None
        }
    }

    fn guards_writes(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    fn identity() -> TokenIdentity {
        TokenIdentity::new(String::from("s3cret"), String::from("/bye"))
    }

    #[test]
    fn test_matching_cookie_is_admin() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ADMIN_COOKIE, "s3cret"))
            .to_http_request();
        assert_eq!(
            Some(Admin {
                logout_url: String::from("/bye")
            }),
            identity().resolve(&req)
        );
    }

    #[test]
    fn test_wrong_or_missing_cookie_is_anonymous() {
        let wrong = TestRequest::default()
            .cookie(Cookie::new(ADMIN_COOKIE, "guess"))
            .to_http_request();
        assert_eq!(None, identity().resolve(&wrong));
        assert_eq!(None, identity().resolve(&TestRequest::default().to_http_request()));
    }

    #[test]
    fn test_anonymous() {
        assert_eq!(None, Anonymous.resolve(&TestRequest::default().to_http_request()));
        assert!(!Anonymous.guards_writes());
    }

    #[test]
    fn test_token_identity_guards_writes() {
        assert!(identity().guards_writes());
    }
}
