use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warp::{Filter, Rejection};

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized: token missing")]
    Missing,
    #[error("Unauthorized: invalid token")]
    Invalid,
}

impl warp::reject::Reject for AuthError {}

/// A valid token whose role does not allow the request.
#[derive(Debug)]
pub struct Forbidden;

impl warp::reject::Reject for Forbidden {}

/// The verified subject of a token, before any account lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: Option<String>,
    pub role: Role,
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Contact address of the account, if it exists.
    async fn find_email(&self, id: &str) -> Result<Option<String>, StoreError>;
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Missing)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::Invalid)?
            .claims;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Turns a handshake credential into the identity a chat session runs as.
///
/// A bad token fails the handshake. A missing or unreachable account does
/// not: the identity comes back without a display name and the client may
/// announce one later.
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: TokenVerifier,
    accounts: Arc<dyn AccountDirectory>,
}

impl IdentityResolver {
    pub fn new(verifier: TokenVerifier, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { verifier, accounts }
    }

    pub async fn resolve(&self, token: Option<&str>) -> Result<UserIdentity, AuthError> {
        let principal = self.verifier.verify(token)?;

        let display_name = match self.accounts.find_email(&principal.id).await {
            Ok(Some(email)) => display_name(&email),
            Ok(None) => {
                warn!("No account found for {}", principal.id);
                None
            }
            Err(e) => {
                warn!("Account lookup failed for {}: {}", principal.id, e);
                None
            }
        };

        Ok(UserIdentity {
            id: principal.id,
            display_name,
            role: principal.role,
        })
    }
}

/// The part of a contact address before its first `@`.
pub fn display_name(email: &str) -> Option<String> {
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Picks the handshake credential: the query token when present, else the
/// authorization header with any `Bearer ` prefix removed.
pub fn handshake_token<'a>(query: Option<&'a str>, header: Option<&'a str>) -> Option<&'a str> {
    query
        .filter(|token| !token.is_empty())
        .or_else(|| header.map(|value| value.strip_prefix("Bearer ").unwrap_or(value)))
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

pub fn handshake(
    resolver: IdentityResolver,
) -> impl Filter<Extract = (UserIdentity,), Error = Rejection> + Clone {
    let query = warp::query::<TokenQuery>()
        .or(warp::any().map(TokenQuery::default))
        .unify();

    query
        .and(warp::header::optional::<String>("authorization"))
        .and_then(move |query: TokenQuery, header: Option<String>| {
            let resolver = resolver.clone();
            async move {
                let token = handshake_token(query.token.as_deref(), header.as_deref());
                resolver.resolve(token).await.map_err(warp::reject::custom)
            }
        })
}

/// Cookie a browser carries its token in for page requests.
pub const SESSION_COOKIE: &str = "auth_token";

/// Picks the page credential: the query token when present, else the
/// session cookie.
pub fn page_token(query: Option<String>, cookie: Option<String>) -> Option<String> {
    query
        .filter(|token| !token.is_empty())
        .or(cookie)
}

/// Verifies the token a browser presents when loading a page. Rejects with
/// [`AuthError`] so the page route can send the browser elsewhere.
pub fn page_access(
    verifier: TokenVerifier,
) -> impl Filter<Extract = (Principal,), Error = Rejection> + Clone {
    let query = warp::query::<TokenQuery>()
        .or(warp::any().map(TokenQuery::default))
        .unify();

    query
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and_then(move |query: TokenQuery, cookie: Option<String>| {
            let verifier = verifier.clone();
            async move {
                let token = page_token(query.token, cookie);
                verifier
                    .verify(token.as_deref())
                    .map_err(warp::reject::custom)
            }
        })
}

/// Requires an `Authorization: Bearer` token, and the admin role when asked.
pub fn authorized(
    verifier: TokenVerifier,
    required: Role,
) -> impl Filter<Extract = (Principal,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let verifier = verifier.clone();
        async move {
            let token = header
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "));
            let principal = verifier.verify(token).map_err(warp::reject::custom)?;
            if required == Role::Admin && principal.role != Role::Admin {
                return Err(warp::reject::custom(Forbidden));
            }
            Ok(principal)
        }
    })
}
