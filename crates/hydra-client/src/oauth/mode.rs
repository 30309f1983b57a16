//! Signup/login discriminator understood by the identity provider.

use std::fmt;

/// Query parameter carrying the discriminator.
pub const MODE_PARAM: &str = "mode";

/// Whether the user intends to log in or to create an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// Default; no parameter is sent.
    #[default]
    Login,
    /// Sent as `mode=signup`.
    Signup,
}

impl LoginMode {
    /// Wire value of the discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
        }
    }

    /// Value to append to the authorization request, if any.
    ///
    /// Login is the provider's default interpretation and carries no parameter.
    #[must_use]
    pub const fn query_value(self) -> Option<&'static str> {
        match self {
            Self::Login => None,
            Self::Signup => Some(self.as_str()),
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
