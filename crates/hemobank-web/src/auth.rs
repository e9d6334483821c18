//! Cookie-token authentication and the role gate.
//!
//! The `token` cookie carries an HS256 JWT whose `sub` claim is the user's
//! UUID. The [`CurrentUser`] extractor is the authentication gate: it parses
//! the cookie, verifies the signature and expiry, and loads the user from
//! the store. Role authorization is a separate, pure check
//! ([`authorize`]) invoked at the top of each protected handler.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hemobank_core::{
  store::BloodStore,
  user::{Role, User},
};

use crate::{AppState, error::Error};

/// Sessions expire a day after issuance; users then log in again.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Name of the credential cookie.
pub const TOKEN_COOKIE: &str = "token";

// ─── Token signing ───────────────────────────────────────────────────────────

/// JWT claims embedded in every credential token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  /// Subject — user ID (UUID string).
  pub sub: String,
  /// Issued-at (Unix timestamp).
  pub iat: i64,
  /// Expiration (Unix timestamp).
  pub exp: i64,
}

/// Issues and verifies credential tokens with a single HMAC secret.
pub struct TokenSigner {
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl TokenSigner {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
    }
  }

  /// Issue a signed token for `user_id`.
  pub fn issue(&self, user_id: Uuid) -> Result<String, Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub: user_id.to_string(),
      iat: now,
      exp: now + TOKEN_TTL_SECS,
    };
    jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
      .map_err(|_| Error::Unauthenticated)
  }

  /// Verify signature and expiry; returns the claims on success.
  pub fn verify(&self, token: &str) -> Result<Claims, Error> {
    jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
      .map(|data| data.claims)
      .map_err(|_| Error::Unauthenticated)
  }
}

// ─── Cookie plumbing ─────────────────────────────────────────────────────────

/// Extract the raw token value from the `Cookie` header, if present.
pub fn token_cookie(headers: &HeaderMap) -> Option<String> {
  let raw = headers.get(header::COOKIE)?.to_str().ok()?;
  raw
    .split(';')
    .map(str::trim)
    .find_map(|pair| pair.strip_prefix("token="))
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

/// `Set-Cookie` value installing the credential cookie.
pub fn session_cookie(token: &str) -> String {
  format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the credential cookie.
pub fn clear_cookie() -> String {
  format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

// ─── Authentication gate ─────────────────────────────────────────────────────

/// The resolved identity of the requester.
///
/// Present in a handler's signature means the request carried a valid token
/// for an existing user; any failure along that path rejects with a redirect
/// to the login page before the handler runs.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: BloodStore + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = token_cookie(&parts.headers).ok_or(Error::Unauthenticated)?;
    let claims = state.tokens.verify(&token)?;
    let user_id =
      Uuid::parse_str(&claims.sub).map_err(|_| Error::Unauthenticated)?;

    let user = state
      .store
      .get_user(user_id)
      .await
      .map_err(Error::Store)?
      .ok_or(Error::Unauthenticated)?;

    Ok(CurrentUser(user))
  }
}

// ─── Role gate ───────────────────────────────────────────────────────────────

/// Permit the request only if the identity's role is in `permitted`.
///
/// Must run after authentication — it takes the already-resolved identity.
pub fn authorize(user: &User, permitted: &[Role]) -> Result<(), Error> {
  if permitted.contains(&user.role) {
    Ok(())
  } else {
    Err(Error::Forbidden)
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a plaintext password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Validation(format!("argon2 error: {e}")))
}

/// Verify a plaintext password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn issue_then_verify_round_trips_the_subject() {
    let signer = TokenSigner::new("test-secret");
    let id = Uuid::new_v4();
    let token = signer.issue(id).unwrap();
    let claims = signer.verify(&token).unwrap();
    assert_eq!(claims.sub, id.to_string());
  }

  #[test]
  fn verify_rejects_wrong_secret() {
    let token = TokenSigner::new("secret-a").issue(Uuid::new_v4()).unwrap();
    assert!(TokenSigner::new("secret-b").verify(&token).is_err());
  }

  #[test]
  fn cookie_header_parsing() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      "theme=dark; token=abc.def.ghi; lang=en".parse().unwrap(),
    );
    assert_eq!(token_cookie(&headers).as_deref(), Some("abc.def.ghi"));

    headers.insert(header::COOKIE, "theme=dark".parse().unwrap());
    assert_eq!(token_cookie(&headers), None);
  }

  #[test]
  fn password_hash_verifies_and_rejects() {
    let hash = hash_password("hunter22").unwrap();
    assert!(verify_password("hunter22", &hash));
    assert!(!verify_password("hunter23", &hash));
    assert!(!verify_password("hunter22", "not-a-phc-string"));
  }

  #[test]
  fn authorize_checks_role_membership() {
    let user = User {
      user_id:       Uuid::new_v4(),
      name:          "A".into(),
      email:         "a@example.com".into(),
      password_hash: String::new(),
      role:          Role::Donor,
      blood_group:   hemobank_core::blood::BloodGroup::OPos,
      phone:         None,
      address:       None,
      age:           None,
      created_at:    Utc::now(),
    };
    assert!(authorize(&user, &[Role::Donor]).is_ok());
    assert!(authorize(&user, &[Role::Donor, Role::Admin]).is_ok());
    assert!(authorize(&user, &[Role::Admin]).is_err());
  }
}
