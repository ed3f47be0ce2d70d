//! VAPID key parsing and generation (RFC 8292).
//!
//! Accepts the two PEM block types the Go original accepted
//! (`webpush/key.go`): SEC1 `EC PRIVATE KEY` and PKCS#8 `PRIVATE KEY`. Any
//! other block type, or a key whose curve isn't P-256, is rejected.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::{DecodeEcPrivateKey, ToEncodedPoint};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use p256::SecretKey;
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum VapidKeyError {
	#[error("unsupported PEM block type: {0}")]
	UnsupportedBlockType(String),
	#[error("malformed PEM: {0}")]
	MalformedPem(String),
	#[error("key is not on the P-256 curve")]
	WrongCurve,
	#[error("failed to encode key: {0}")]
	Encode(String),
}

/// A parsed or generated VAPID signing key, always P-256.
#[derive(Clone)]
pub struct VapidKey {
	secret: SecretKey,
}

impl std::fmt::Debug for VapidKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VapidKey").field("public_key", &self.public_url_b64()).finish()
	}
}

const SEC1_BLOCK: &str = "EC PRIVATE KEY";
const PKCS8_BLOCK: &str = "PRIVATE KEY";

impl VapidKey {
	/// Parses a single PEM block containing an ES256 private key. The
	/// P-256 curve requirement is enforced by `p256::SecretKey`'s type
	/// itself: a SEC1/PKCS#8 key for any other curve fails to parse here.
	pub fn decode_pem(input: &str) -> Result<Self, VapidKeyError> {
		let parsed = pem::parse(input).map_err(|e| VapidKeyError::MalformedPem(e.to_string()))?;
		let secret = match parsed.tag() {
			SEC1_BLOCK => SecretKey::from_sec1_der(parsed.contents())
				.map_err(|e| VapidKeyError::MalformedPem(e.to_string()))?,
			PKCS8_BLOCK => SecretKey::from_pkcs8_der(parsed.contents())
				.map_err(|_| VapidKeyError::WrongCurve)?,
			other => return Err(VapidKeyError::UnsupportedBlockType(other.to_string())),
		};
		Ok(Self { secret })
	}

	pub fn generate() -> Self {
		Self { secret: SecretKey::random(&mut OsRng) }
	}

	pub fn to_pem(&self, private: bool) -> Result<String, VapidKeyError> {
		if private {
			self.secret
				.to_pkcs8_pem(LineEnding::LF)
				.map(|doc| doc.to_string())
				.map_err(|e| VapidKeyError::Encode(e.to_string()))
		} else {
			let public_der = self.secret.public_key().to_public_key_der()
				.map_err(|e| VapidKeyError::Encode(e.to_string()))?;
			Ok(pem::encode(&pem::Pem::new("PUBLIC KEY", public_der.as_bytes())))
		}
	}

	pub fn public_raw_uncompressed(&self) -> [u8; 65] {
		let point = self.secret.public_key().to_encoded_point(false);
		let bytes = point.as_bytes();
		let mut out = [0u8; 65];
		out.copy_from_slice(bytes);
		out
	}

	pub fn public_url_b64(&self) -> String {
		URL_SAFE_NO_PAD.encode(self.public_raw_uncompressed())
	}

	pub fn signing_key(&self) -> SigningKey {
		SigningKey::from(&self.secret)
	}

	pub fn secret(&self) -> &SecretKey {
		&self.secret
	}
}
