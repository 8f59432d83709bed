//! RFC 7517/7518 JSON representation of RSA signing keys.

// crates.io
use base64::prelude::*;
use jsonwebtoken::Algorithm;
use rsa::{
	BigUint, RsaPrivateKey, RsaPublicKey,
	traits::{PrivateKeyParts, PublicKeyParts},
};
use serde::{Deserialize, Serialize};
// self
use crate::{
	_prelude::*,
	key::{KeyType, SIGNATURE_USE, SigningKey},
};

/// Wire form of a single JWK; private members are only present for private keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct RawJwk {
	kty: String,
	#[serde(rename = "use", default = "default_use")]
	key_use: String,
	kid: String,
	alg: Algorithm,
	n: String,
	e: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	d: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	p: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	q: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	dp: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	dq: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	qi: Option<String>,
}
impl From<SigningKey> for RawJwk {
	fn from(key: SigningKey) -> Self {
		let mut raw = Self {
			kty: key.key_type().as_str().into(),
			key_use: SIGNATURE_USE.into(),
			kid: key.kid,
			alg: key.algorithm,
			n: encode_uint(key.public.n()),
			e: encode_uint(key.public.e()),
			d: None,
			p: None,
			q: None,
			dp: None,
			dq: None,
			qi: None,
		};

		if let Some(private) = &key.private {
			raw.d = Some(encode_uint(private.d()));

			if let [p, q] = private.primes() {
				raw.p = Some(encode_uint(p));
				raw.q = Some(encode_uint(q));
				raw.dp = private.dp().map(encode_uint);
				raw.dq = private.dq().map(encode_uint);
				raw.qi = private.crt_coefficient().as_ref().map(encode_uint);
			}
		}

		raw
	}
}
impl TryFrom<RawJwk> for SigningKey {
	type Error = Error;

	fn try_from(raw: RawJwk) -> Result<Self> {
		let key_type = raw.kty.parse::<KeyType>()?;

		if !key_type.supports(raw.alg) {
			return Err(Error::Validation {
				field: "alg",
				reason: format!("Algorithm {:?} cannot be used with {key_type} keys.", raw.alg),
			});
		}

		if raw.key_use != SIGNATURE_USE {
			return Err(Error::Validation {
				field: "use",
				reason: format!("Expected '{SIGNATURE_USE}' but found '{}'.", raw.key_use),
			});
		}

		let n = decode_uint("n", &raw.n)?;
		let e = decode_uint("e", &raw.e)?;
		let size = n.bits() as u32;
		let public = RsaPublicKey::new(n.clone(), e.clone()).map_err(|err| Error::Validation {
			field: "n",
			reason: format!("Invalid RSA public key: {err}."),
		})?;
		let private = match raw.d {
			None => None,
			Some(d) => {
				let (Some(p), Some(q)) = (raw.p, raw.q) else {
					return Err(Error::Validation {
						field: "p",
						reason: "Private RSA keys must carry both prime factors.".into(),
					});
				};
				let primes = vec![decode_uint("p", &p)?, decode_uint("q", &q)?];
				let d = decode_uint("d", &d)?;
				let mut private = RsaPrivateKey::from_components(n, e, d, primes)
					.map_err(|err| Error::Validation {
						field: "d",
						reason: format!("Invalid RSA private key: {err}."),
					})?;

				private.precompute().map_err(|err| Error::Validation {
					field: "d",
					reason: format!("Failed to precompute CRT values: {err}."),
				})?;

				Some(private)
			},
		};

		Ok(Self { kid: raw.kid, algorithm: raw.alg, key_type, size, public, private })
	}
}

pub(crate) fn encode_uint(value: &BigUint) -> String {
	BASE64_URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

fn decode_uint(field: &'static str, value: &str) -> Result<BigUint> {
	let bytes = BASE64_URL_SAFE_NO_PAD.decode(value).map_err(|err| Error::Validation {
		field,
		reason: format!("Invalid base64url integer: {err}."),
	})?;

	Ok(BigUint::from_bytes_be(&bytes))
}

fn default_use() -> String {
	SIGNATURE_USE.into()
}
