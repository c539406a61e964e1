use headers::{Authorization, HeaderMapExt};
use http::{HeaderMap, Request};

use crate::config::SecretString;

/// HTTP Basic authentication.
///
/// The username and password are concatenated and encoded via base64.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub password: SecretString,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn apply<B>(&self, req: &mut Request<B>) {
        self.apply_headers_map(req.headers_mut())
    }

    pub fn apply_headers_map(&self, map: &mut HeaderMap) {
        map.typed_insert(Authorization::basic(&self.user, self.password.inner()));
    }
}
