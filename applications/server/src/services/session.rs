/// Session tokens - HS256 JWTs naming a patron, role and venue
use crate::error::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use jukebox_core::{Identity, PatronId, Role, RoomId, SessionDirectory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtSessionDirectory {
    secret: String,
    expiration: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (patron ID)
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
}

impl Claims {
    pub fn into_identity(self) -> Identity {
        Identity {
            patron_id: PatronId::new(self.sub),
            role: self.role,
            venue: self.venue.map(RoomId::new),
        }
    }
}

impl JwtSessionDirectory {
    pub fn new(secret: String, expiration_hours: u64) -> Self {
        Self {
            secret,
            expiration: Duration::hours(expiration_hours as i64),
        }
    }

    /// Issue a session token with the default lifetime
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        self.issue_for(identity, self.expiration)
    }

    /// Issue a session token valid for `lifetime`
    pub fn issue_for(&self, identity: &Identity, lifetime: Duration) -> Result<String> {
        let now = Utc::now();
        let exp = now + lifetime;

        let claims = Claims {
            sub: identity.patron_id.as_str().to_string(),
            role: identity.role,
            venue: identity.venue.as_ref().map(|room| room.as_str().to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }

    /// Verify and decode a token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl SessionDirectory for JwtSessionDirectory {
    async fn resolve(&self, token: &str) -> Option<Identity> {
        match self.verify(token) {
            Ok(claims) => Some(claims.into_identity()),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}
