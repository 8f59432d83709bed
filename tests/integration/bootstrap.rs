//! Integration tests for startup key handling on disk.

// std
use std::{fs, path::PathBuf};
// crates.io
use jsonwebtoken::{Algorithm, decode_header};
use mock_oidc::{
	Error, FileKeyStore, KeyLifecycle, KeySpec, KeyStore, OidcConfig, Provider, Regeneration,
	Result,
	lifecycle::{PRIVATE_KEY_SET, PUBLIC_KEY_SET},
};

fn scratch_dir(label: &str) -> PathBuf {
	std::env::temp_dir().join(format!("mock-oidc-it-{label}-{}", uuid::Uuid::new_v4()))
}

#[test]
fn restart_without_regeneration_serves_the_same_keys() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();
	let dir = scratch_dir("restart");
	let config = OidcConfig::default().with_keys_dir(&dir).with_number_of_keys(2);
	let first = Provider::bootstrap(config.clone())?;
	let public_before = fs::read(dir.join(PUBLIC_KEY_SET))?;
	let private_before = fs::read(dir.join(PRIVATE_KEY_SET))?;
	let second = Provider::bootstrap(config.with_regenerate_at_start(false))?;

	assert_eq!(fs::read(dir.join(PUBLIC_KEY_SET))?, public_before);
	assert_eq!(fs::read(dir.join(PRIVATE_KEY_SET))?, private_before);
	assert_eq!(first.public_jwks().to_json()?, second.public_jwks().to_json()?);

	Ok(())
}

#[test]
fn persisted_sets_share_kids_in_order() -> Result<()> {
	let dir = scratch_dir("layout");
	let store = FileKeyStore::create_dir(&dir)?;
	let lifecycle = KeyLifecycle::new(&store);

	assert_eq!(
		lifecycle.ensure_keys_ready(false, &KeySpec { count: 3, ..KeySpec::default() })?,
		Regeneration::Regenerated
	);

	let public = store.read(PUBLIC_KEY_SET)?;
	let private = store.read(PRIVATE_KEY_SET)?;

	assert!(!public.has_private_material());
	assert!(private.iter().all(|key| key.is_private()));
	assert_eq!(public.kids().collect::<Vec<_>>(), private.kids().collect::<Vec<_>>());

	Ok(())
}

#[test]
fn corrupted_artifacts_fail_startup() -> Result<()> {
	let dir = scratch_dir("corrupt");
	let config = OidcConfig::default().with_keys_dir(&dir).with_number_of_keys(1);

	Provider::bootstrap(config.clone())?;
	fs::write(dir.join(PUBLIC_KEY_SET), "{\"keys\": []}")?;

	assert!(matches!(
		Provider::bootstrap(config.with_regenerate_at_start(false)),
		Err(Error::KeySetParse { .. })
	));

	Ok(())
}

#[test]
fn persisted_keys_must_match_the_configured_algorithm() -> Result<()> {
	let dir = scratch_dir("algorithm");
	let config = OidcConfig::default().with_keys_dir(&dir).with_number_of_keys(2);

	Provider::bootstrap(config.clone())?;

	let switched = OidcConfig { algorithm: Algorithm::PS512, ..config };

	assert!(matches!(
		Provider::bootstrap(switched.clone().with_regenerate_at_start(false)),
		Err(Error::KeySetMismatch(_))
	));

	let provider = Provider::bootstrap(switched)?;
	let token = provider.issue_token()?;
	let header = decode_header(&token)?;
	let kid = header.kid.expect("kid header");
	let jwk = provider.public_jwks().find(&kid).expect("kid resolves in the public set");

	assert_eq!(header.alg, jwk.algorithm());
	assert_eq!(provider.openid_configuration().id_token_signing_alg_values_supported, [
		jwk.algorithm()
	]);

	Ok(())
}
