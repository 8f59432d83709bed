//! Integration tests for the HTTP routes.

// std
use std::{net::SocketAddr, sync::Arc};
// crates.io
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use mock_oidc::{
	Claims, GenerateKeys, KeyRing, KeySet, KeySpec, OidcConfig, Provider, ProviderMetadata,
	Result, RsaKeyGenerator,
	server::{self, TokenResponse},
	token::AUDIENCE,
};
use serde_json::Value;
use tokio::net::TcpListener;

async fn spawn_provider(config: OidcConfig) -> Result<SocketAddr> {
	let spec = KeySpec { count: 2, ..config.key_spec() };
	let ring = KeyRing::from_private(RsaKeyGenerator.generate(&spec)?)?;
	let provider = Arc::new(Provider::new(config, ring)?);
	let listener = TcpListener::bind("127.0.0.1:0").await?;
	let addr = listener.local_addr()?;

	tokio::spawn(server::serve(listener, provider));

	Ok(addr)
}

#[tokio::test]
async fn issued_tokens_verify_against_the_served_jwks() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();
	let addr = spawn_provider(OidcConfig::default().with_issuer("http://issuer.test")).await?;
	let client = reqwest::Client::new();
	let jwks: KeySet = client
		.get(format!("http://{addr}{}", server::JWKS_ROUTE))
		.send()
		.await
		.expect("jwks request")
		.json()
		.await
		.expect("jwks body");

	assert_eq!(jwks.len(), 2);
	assert!(!jwks.has_private_material());

	for _ in 0..5 {
		let response: TokenResponse = client
			.get(format!("http://{addr}{}", server::TOKEN_ROUTE))
			.send()
			.await
			.expect("token request")
			.json()
			.await
			.expect("token body");
		let kid = decode_header(&response.token)?.kid.expect("kid header");
		let key = jwks.find(&kid).expect("kid resolves in the served JWKS");
		let mut validation = Validation::new(Algorithm::RS256);

		validation.set_audience(&[AUDIENCE]);
		validation.set_issuer(&["http://issuer.test"]);

		let claims = decode::<Claims>(&response.token, &key.decoding_key()?, &validation)?.claims;

		assert_eq!(claims.sub, "thetoken");
		assert_eq!(claims.exp - claims.iat, 1_800);
	}

	Ok(())
}

#[tokio::test]
async fn jwks_document_is_plain_jwk_json() -> Result<()> {
	let addr = spawn_provider(OidcConfig::default()).await?;
	let response = reqwest::get(format!("http://{addr}{}", server::JWKS_ROUTE))
		.await
		.expect("jwks request");

	assert_eq!(response.headers()["content-type"], "application/json");

	let body: Value = response.json().await.expect("jwks body");
	let keys = body["keys"].as_array().expect("keys array");

	assert_eq!(keys.len(), 2);

	for key in keys {
		assert_eq!(key["kty"], "RSA");
		assert_eq!(key["use"], "sig");
		assert_eq!(key["alg"], "RS256");
		assert_eq!(key["e"], "AQAB");
		assert!(key["kid"].is_string());
		assert!(key["n"].is_string());
		assert!(key.get("d").is_none());
	}

	Ok(())
}

#[tokio::test]
async fn discovery_document_points_at_the_jwks() -> Result<()> {
	let addr = spawn_provider(OidcConfig::default().with_issuer("https://issuer.test")).await?;
	let response = reqwest::get(format!("http://{addr}{}", server::DISCOVERY_ROUTE))
		.await
		.expect("discovery request");

	assert!(response.status().is_success());

	let metadata: ProviderMetadata = response.json().await.expect("discovery body");

	assert_eq!(metadata.issuer, "https://issuer.test");
	assert_eq!(metadata.jwks_uri, "https://issuer.test/.well-known/jwks");
	assert_eq!(metadata.id_token_signing_alg_values_supported, [Algorithm::RS256]);

	Ok(())
}

#[tokio::test]
async fn signing_failures_surface_as_json_500s() -> Result<()> {
	// Bypasses validation so the token route has to report the bad lifetime.
	let config = OidcConfig { token_expiration: "forever".into(), ..OidcConfig::default() };
	let addr = spawn_provider(config).await?;
	let response = reqwest::get(format!("http://{addr}{}", server::TOKEN_ROUTE))
		.await
		.expect("token request");

	assert_eq!(response.status().as_u16(), 500);

	let body: Value = response.json().await.expect("error body");

	assert!(body["error"].as_str().is_some_and(|error| error.contains("forever")));

	Ok(())
}
