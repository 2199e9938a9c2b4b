// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session provider: where components get the bearer token and current user.
//!
//! Components read the session through [`Cx::session`](crate::Cx::session) instead
//! of reaching into a global store, so tests can swap in a [`MemorySession`].

use std::cell::RefCell;
use std::fmt;

use serde::Deserialize;

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// The signed-in user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role used for permission checks (`admin`, `staff`, ...).
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    /// Parse a profile from the JSON shape kept in client storage.
    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }
}

/// Narrow read-only view of the current session.
pub trait SessionProvider {
    /// Current bearer token, if signed in.
    fn token(&self) -> Option<Token>;
    /// Current user profile, if signed in.
    fn current_user(&self) -> Option<Profile>;
}

/// A session that is never signed in.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSession;

impl SessionProvider for NoSession {
    fn token(&self) -> Option<Token> {
        None
    }

    fn current_user(&self) -> Option<Profile> {
        None
    }
}

/// In-memory session, mutable through a shared reference.
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RefCell<Option<(Token, Profile)>>,
}

impl MemorySession {
    /// Create a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store credentials.
    pub fn sign_in(&self, token: Token, profile: Profile) {
        *self.inner.borrow_mut() = Some((token, profile));
    }

    /// Drop credentials.
    pub fn sign_out(&self) {
        self.inner.borrow_mut().take();
    }
}

impl SessionProvider for MemorySession {
    fn token(&self) -> Option<Token> {
        self.inner.borrow().as_ref().map(|(t, _)| t.clone())
    }

    fn current_user(&self) -> Option<Profile> {
        self.inner.borrow().as_ref().map(|(_, p)| p.clone())
    }
}
