use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::credentials::{AuthorizedUserKey, Credential, ServiceAccountKey};

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str =
	"https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/datastore";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

// Refresh this long before the reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct AssertionClaims {
	iss: String,
	scope: String,
	aud: String,
	iat: i64,
	exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
	value: String,
	fetched: Instant,
	ttl: Duration,
}

impl CachedToken {
	fn fresh(&self) -> bool {
		self.fetched.elapsed() < self.ttl
	}
}

/// Exchanges the resolved credential for OAuth2 bearer tokens, lazily and
/// cached for their lifetime. Single-threaded by contract, so a plain
/// Option is enough.
#[derive(Debug)]
pub struct TokenProvider {
	credential: Credential,
	cached: Option<CachedToken>,
	verbose: bool,
}

impl TokenProvider {
	pub fn new(credential: Credential, verbose: bool) -> Self {
		Self {
			credential,
			cached: None,
			verbose,
		}
	}

	pub async fn bearer_token(&mut self, http: &reqwest::Client) -> Result<String> {
		if let Credential::EmulatorOwner = self.credential {
			return Ok("owner".to_string());
		}

		if let Some(cached) = &self.cached {
			if cached.fresh() {
				return Ok(cached.value.clone());
			}
		}

		let response = match &self.credential {
			Credential::ServiceAccount(key) => service_account_token(http, key).await?,
			Credential::AuthorizedUser(key) => refresh_token_grant(http, key).await?,
			Credential::Metadata { host } => metadata_token(http, host).await?,
			Credential::EmulatorOwner => unreachable!(),
		};

		if self.verbose {
			let expiry = OffsetDateTime::now_utc() + time::Duration::seconds(response.expires_in as i64);
			println!(
				"access token acquired, expires {}",
				expiry.format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
			);
		}

		let ttl = Duration::from_secs(response.expires_in.saturating_sub(REFRESH_MARGIN.as_secs()));
		self.cached = Some(CachedToken {
			value: response.access_token.clone(),
			fetched: Instant::now(),
			ttl,
		});

		Ok(response.access_token)
	}
}

async fn service_account_token(
	http: &reqwest::Client,
	key: &ServiceAccountKey,
) -> Result<TokenResponse> {
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let claims = AssertionClaims {
		iss: key.client_email.clone(),
		scope: SCOPES.to_string(),
		aud: key.token_uri.clone(),
		iat: now,
		exp: now + ASSERTION_LIFETIME_SECS,
	};

	let mut header = Header::new(Algorithm::RS256);
	header.kid = Some(key.private_key_id.clone());

	let encoding = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
		.context("parsing service account private key")?;
	let assertion = jsonwebtoken::encode(&header, &claims, &encoding)
		.context("signing service account assertion")?;

	let resp = http
		.post(&key.token_uri)
		.form(&[
			("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
			("assertion", assertion.as_str()),
		])
		.send()
		.await
		.with_context(|| format!("token request to {} failed", key.token_uri))?;

	decode_token_response(resp).await
}

async fn refresh_token_grant(
	http: &reqwest::Client,
	key: &AuthorizedUserKey,
) -> Result<TokenResponse> {
	let resp = http
		.post(GOOGLE_TOKEN_URI)
		.form(&[
			("grant_type", "refresh_token"),
			("client_id", key.client_id.as_str()),
			("client_secret", key.client_secret.as_str()),
			("refresh_token", key.refresh_token.as_str()),
		])
		.send()
		.await
		.context("refresh token request failed")?;

	decode_token_response(resp).await
}

async fn metadata_token(http: &reqwest::Client, host: &str) -> Result<TokenResponse> {
	let base = if host.starts_with("http://") || host.starts_with("https://") {
		host.to_string()
	} else {
		format!("http://{host}")
	};
	let url = format!("{base}/computeMetadata/v1/instance/service-accounts/default/token");

	let resp = http
		.get(&url)
		.header("Metadata-Flavor", "Google")
		.send()
		.await
		.with_context(|| format!("metadata token request to {url} failed"))?;

	decode_token_response(resp).await
}

async fn decode_token_response(resp: reqwest::Response) -> Result<TokenResponse> {
	let status = resp.status();
	let body = resp.text().await.context("reading token response")?;
	if !status.is_success() {
		bail!("token endpoint returned {status}: {body}");
	}
	serde_json::from_str(&body).context("decoding token response")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::credentials::Credential;

	#[tokio::test]
	async fn emulator_token_is_the_owner_constant_without_network() {
		let mut provider = TokenProvider::new(Credential::EmulatorOwner, false);
		let http = reqwest::Client::new();
		assert_eq!(provider.bearer_token(&http).await.unwrap(), "owner");
	}

	#[test]
	fn cached_token_expires_after_its_ttl() {
		let cached = CachedToken {
			value: "t".to_string(),
			fetched: Instant::now(),
			ttl: Duration::from_secs(3600),
		};
		assert!(cached.fresh());

		let stale = CachedToken {
			value: "t".to_string(),
			fetched: Instant::now(),
			ttl: Duration::ZERO,
		};
		assert!(!stale.fresh());
	}

	#[test]
	fn assertion_claims_carry_the_oauth_fields() {
		let claims = AssertionClaims {
			iss: "seeder@p.iam.gserviceaccount.com".to_string(),
			scope: SCOPES.to_string(),
			aud: GOOGLE_TOKEN_URI.to_string(),
			iat: 1_700_000_000,
			exp: 1_700_000_000 + ASSERTION_LIFETIME_SECS,
		};
		let v = serde_json::to_value(&claims).unwrap();
		assert_eq!(v["iss"], "seeder@p.iam.gserviceaccount.com");
		assert_eq!(v["aud"], GOOGLE_TOKEN_URI);
		assert_eq!(v["exp"].as_i64().unwrap() - v["iat"].as_i64().unwrap(), 3600);
		assert!(v["scope"].as_str().unwrap().contains("datastore"));
	}

	#[test]
	fn token_response_decodes_the_google_shape() {
		let resp: TokenResponse = serde_json::from_str(
			r#"{"access_token": "ya29.abc", "expires_in": 3599, "token_type": "Bearer"}"#,
		)
		.unwrap();
		assert_eq!(resp.access_token, "ya29.abc");
		assert_eq!(resp.expires_in, 3599);
	}
}
