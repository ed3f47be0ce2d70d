//! Message encryption: RFC 8291 (Message Encryption for Web Push) layered on
//! RFC 8188's `aes128gcm` content coding.
//!
//! The key schedule below follows RFC 8291 §3.4 exactly (HKDF labels,
//! lengths, and the order salt/IKM are used in each HKDF stage); the
//! RFC 8291 Appendix A fixture is reproduced byte-for-byte in
//! `tests::rfc8291_appendix_a_fixture`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use webpush_types::subscription::{Keys, AUTH_RAW_LEN, P256DH_RAW_LEN};

/// RFC 8291 §4: the largest plaintext a single aes128gcm record can carry
/// under the 4096-byte record size this implementation always uses.
pub const MAX_PLAINTEXT_LEN: usize = 3993;
const RECORD_SIZE: u32 = 4096;
const PADDING_DELIMITER: u8 = 0x02;
const AES_GCM_TAG_LEN: usize = 16;
/// salt(16) ‖ rs(4) ‖ idlen(1) ‖ keyid(65).
const HEADER_LEN: usize = 16 + 4 + 1 + P256DH_RAW_LEN;

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
	#[error("plaintext exceeds {MAX_PLAINTEXT_LEN} bytes")]
	TooLarge,
	#[error("internal encryption failure: {0}")]
	Internal(String),
}

/// Controls the one test-only deviation from the normative padding scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptOptions {
	/// When true, omits the zero-fill to `MAX_PLAINTEXT_LEN`; the `0x02`
	/// delimiter is still written. Mirrors the `SKIP_PADDING` env var.
	pub skip_padding: bool,
}

impl EncryptOptions {
	pub fn from_env() -> Self {
		Self { skip_padding: std::env::var("SKIP_PADDING").is_ok() }
	}
}

/// One encryption attempt's ephemeral material. Consumes `self` on
/// `encrypt`/`encrypt_with_options` so a single instance can back exactly
/// one message, per RFC 8291's requirement that the (salt, ephemeral key)
/// pair never be reused.
pub struct ContentEncryptor {
	client_public: [u8; P256DH_RAW_LEN],
	auth_secret: [u8; AUTH_RAW_LEN],
	server_secret: SecretKey,
	server_public: [u8; P256DH_RAW_LEN],
	salt: [u8; 16],
}

impl ContentEncryptor {
	/// Decodes the subscription's keys and generates fresh ephemeral
	/// material (keypair + salt) for one delivery attempt.
	pub fn new(keys: &Keys) -> Result<Self, EncryptError> {
		let client_public = decode_fixed::<P256DH_RAW_LEN>(&keys.p256dh, "p256dh")?;
		let auth_secret = decode_fixed::<AUTH_RAW_LEN>(&keys.auth, "auth")?;

		let server_secret = SecretKey::random(&mut OsRng);
		let server_public = encode_public_point(&server_secret);

		let mut salt = [0u8; 16];
		OsRng.fill_bytes(&mut salt);

		Ok(Self { client_public, auth_secret, server_secret, server_public, salt })
	}

	/// Encrypts `plaintext`, reading [`EncryptOptions`] from the process
	/// environment (`SKIP_PADDING`).
	pub fn encrypt(self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptError> {
		self.encrypt_with_options(plaintext, &EncryptOptions::from_env())
	}

	pub fn encrypt_with_options(
		self,
		plaintext: &[u8],
		options: &EncryptOptions,
	) -> Result<Vec<u8>, EncryptError> {
		if plaintext.len() > MAX_PLAINTEXT_LEN {
			return Err(EncryptError::TooLarge);
		}

		let client_pub = PublicKey::from_sec1_bytes(&self.client_public)
			.map_err(|_| EncryptError::Internal("invalid client p256dh point".into()))?;
		let shared = p256::ecdh::diffie_hellman(
			&self.server_secret.to_nonzero_scalar(),
			client_pub.as_affine(),
		);

		let schedule = derive_key_schedule(
			shared.raw_secret_bytes(),
			&self.auth_secret,
			&self.client_public,
			&self.server_public,
			&self.salt,
		)?;

		let padded = pad_plaintext(plaintext, options.skip_padding);

		let cipher = Aes128Gcm::new_from_slice(&schedule.cek)
			.map_err(|_| EncryptError::Internal("bad content encryption key".into()))?;
		let nonce = Nonce::from_slice(&schedule.nonce);
		let ciphertext = cipher
			.encrypt(nonce, padded.as_slice())
			.map_err(|_| EncryptError::Internal("AEAD seal failed".into()))?;

		let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
		out.extend_from_slice(&self.salt);
		out.extend_from_slice(&RECORD_SIZE.to_be_bytes());
		out.push(P256DH_RAW_LEN as u8);
		out.extend_from_slice(&self.server_public);
		out.extend_from_slice(&ciphertext);
		Ok(out)
	}
}

struct KeySchedule {
	#[cfg_attr(not(test), allow(dead_code))]
	ikm: [u8; 32],
	#[cfg_attr(not(test), allow(dead_code))]
	prk: [u8; 32],
	cek: [u8; 16],
	nonce: [u8; 12],
}

/// RFC 8291 §3.4 key schedule: IKM via HKDF-Expand keyed on the auth
/// secret, then CEK and nonce via HKDF-Expand keyed on a fresh
/// HKDF-Extract over the per-message salt.
fn derive_key_schedule(
	shared_secret: &[u8],
	auth_secret: &[u8; AUTH_RAW_LEN],
	client_public: &[u8; P256DH_RAW_LEN],
	server_public: &[u8; P256DH_RAW_LEN],
	salt: &[u8; 16],
) -> Result<KeySchedule, EncryptError> {
	let mut ikm_info = Vec::with_capacity(14 + P256DH_RAW_LEN * 2);
	ikm_info.extend_from_slice(b"WebPush: info");
	ikm_info.push(0);
	ikm_info.extend_from_slice(client_public);
	ikm_info.extend_from_slice(server_public);

	let ikm_hkdf = Hkdf::<Sha256>::new(Some(auth_secret), shared_secret);
	let mut ikm = [0u8; 32];
	ikm_hkdf
		.expand(&ikm_info, &mut ikm)
		.map_err(|_| EncryptError::Internal("hkdf expand (ikm) failed".into()))?;

	let (prk_block, prk_hkdf) = Hkdf::<Sha256>::extract(Some(salt), &ikm);
	let mut prk = [0u8; 32];
	prk.copy_from_slice(&prk_block);

	let mut cek = [0u8; 16];
	prk_hkdf
		.expand(b"Content-Encoding: aes128gcm\0", &mut cek)
		.map_err(|_| EncryptError::Internal("hkdf expand (cek) failed".into()))?;

	let mut nonce = [0u8; 12];
	prk_hkdf
		.expand(b"Content-Encoding: nonce\0", &mut nonce)
		.map_err(|_| EncryptError::Internal("hkdf expand (nonce) failed".into()))?;

	Ok(KeySchedule { ikm, prk, cek, nonce })
}

fn pad_plaintext(plaintext: &[u8], skip_padding: bool) -> Vec<u8> {
	let target_len = if skip_padding { plaintext.len() + 1 } else { MAX_PLAINTEXT_LEN + 1 };
	let mut block = Vec::with_capacity(target_len);
	block.extend_from_slice(plaintext);
	block.push(PADDING_DELIMITER);
	block.resize(target_len, 0);
	block
}

fn encode_public_point(secret: &SecretKey) -> [u8; P256DH_RAW_LEN] {
	let point = secret.public_key().to_encoded_point(false);
	let mut out = [0u8; P256DH_RAW_LEN];
	out.copy_from_slice(point.as_bytes());
	out
}

fn decode_fixed<const N: usize>(b64: &str, field: &str) -> Result<[u8; N], EncryptError> {
	let bytes = URL_SAFE_NO_PAD
		.decode(b64)
		.map_err(|_| EncryptError::Internal(format!("{field}: not valid base64url")))?;
	if bytes.len() != N {
		return Err(EncryptError::Internal(format!("{field}: expected {N} raw bytes, got {}", bytes.len())));
	}
	let mut out = [0u8; N];
	out.copy_from_slice(&bytes);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn b64(s: &str) -> Vec<u8> {
		URL_SAFE_NO_PAD.decode(s).expect("valid fixture base64url")
	}

	fn b64_fixed<const N: usize>(s: &str) -> [u8; N] {
		let v = b64(s);
		let mut out = [0u8; N];
		out.copy_from_slice(&v);
		out
	}

	/// RFC 8291 Appendix A, reproduced byte-for-byte including every
	/// intermediate HKDF value the RFC publishes.
	#[test]
	fn rfc8291_appendix_a_fixture() {
		let plaintext = b"When I grow up, I want to be a watermelon";
		let client_public: [u8; P256DH_RAW_LEN] = b64_fixed(
			"BCVxsr7N_eNgVRqvHtD0zTZsEc6-VV-JvLexhqUzORcxaOzi6-AYWXvTBHm4bjyPjs7Vd8pZGH6SRpkNtoIAiw4",
		);
		let auth_secret: [u8; AUTH_RAW_LEN] = b64_fixed("BTBZMqHH6r4Tts7J_aSIgg");
		let server_priv_raw = b64("yfWPiYE-n46HLnH0KqZOF1fJJU3MYrct3AELtAQ-oRw");
		let salt: [u8; 16] = b64_fixed("DGv6ra1nlYgDCS1FRnbzlw");

		let server_secret = SecretKey::from_slice(&server_priv_raw).expect("valid private scalar");
		let server_public = encode_public_point(&server_secret);

		let client_pub = PublicKey::from_sec1_bytes(&client_public).expect("valid client point");
		let shared =
			p256::ecdh::diffie_hellman(&server_secret.to_nonzero_scalar(), client_pub.as_affine());
		assert_eq!(
			shared.raw_secret_bytes().as_slice(),
			b64("kyrL1jIIOHEzg3sM2ZWRHDRB62YACZhhSlknJ672kSs").as_slice(),
		);

		let schedule =
			derive_key_schedule(shared.raw_secret_bytes(), &auth_secret, &client_public, &server_public, &salt)
				.expect("derive schedule");
		assert_eq!(schedule.ikm.as_slice(), b64("S4lYMb_L0FxCeq0WhDx813KgSYqU26kOyzWUdsXYyrg").as_slice());
		assert_eq!(schedule.prk.as_slice(), b64("09_eUZGrsvxChDCGRCdkLiDXrReGOEVeSCdCcPBSJSc").as_slice());
		assert_eq!(schedule.cek.as_slice(), b64("oIhVW04MRdy2XN9CiKLxTg").as_slice());
		assert_eq!(schedule.nonce.as_slice(), b64("4h_95klXJ5E_qnoN").as_slice());

		let encryptor = ContentEncryptor {
			client_public,
			auth_secret,
			server_secret,
			server_public,
			salt,
		};
		let envelope = encryptor
			.encrypt_with_options(plaintext, &EncryptOptions { skip_padding: true })
			.expect("encrypt");

		let expected = b64(
			"DGv6ra1nlYgDCS1FRnbzlwAAEABBBP4z9KsN6nGRTbVYI_c7VJSPQTBtkgcy27mlmlMoZIIgDll6e3vCYLocInmYWAmS6TlzAC8wEqKK6PBru3jl7A_yl95bQpu6cVPTpK4Mqgkf1CXztLVBSt2Ks3oZwbuwXPXLWyouBWLVWGNWQexSgSxsj_Qulcy4a-fN",
		);
		assert_eq!(envelope, expected);
	}

	#[test]
	fn header_layout_is_86_bytes_with_expected_fields() {
		let peer = SecretKey::random(&mut OsRng);
		let keys = Keys {
			p256dh: URL_SAFE_NO_PAD.encode(encode_public_point(&peer)),
			auth: URL_SAFE_NO_PAD.encode([1u8; AUTH_RAW_LEN]),
		};

		let encryptor = ContentEncryptor::new(&keys).expect("new encryptor");
		let server_public_expected = encryptor.server_public;
		let envelope = encryptor.encrypt(b"hello").expect("encrypt");

		assert_eq!(&envelope[16..20], &RECORD_SIZE.to_be_bytes());
		assert_eq!(envelope[20], P256DH_RAW_LEN as u8);
		assert_eq!(&envelope[21..86], &server_public_expected[..]);
	}

	#[test]
	fn default_padding_produces_fixed_length_ciphertext() {
		let peer = SecretKey::random(&mut OsRng);
		let keys = Keys {
			p256dh: URL_SAFE_NO_PAD.encode(encode_public_point(&peer)),
			auth: URL_SAFE_NO_PAD.encode([7u8; AUTH_RAW_LEN]),
		};
		let encryptor = ContentEncryptor::new(&keys).expect("new encryptor");
		let envelope = encryptor
			.encrypt_with_options(b"short message", &EncryptOptions { skip_padding: false })
			.expect("encrypt");
		assert_eq!(envelope.len() - HEADER_LEN, MAX_PLAINTEXT_LEN + 1 + AES_GCM_TAG_LEN);
	}

	#[test]
	fn plaintext_over_limit_is_rejected() {
		let peer = SecretKey::random(&mut OsRng);
		let keys = Keys {
			p256dh: URL_SAFE_NO_PAD.encode(encode_public_point(&peer)),
			auth: URL_SAFE_NO_PAD.encode([2u8; AUTH_RAW_LEN]),
		};
		let encryptor = ContentEncryptor::new(&keys).expect("new encryptor");
		let oversized = vec![0u8; MAX_PLAINTEXT_LEN + 1];
		let err = encryptor.encrypt(&oversized).unwrap_err();
		assert!(matches!(err, EncryptError::TooLarge));
	}

	#[test]
	fn malformed_auth_secret_length_is_rejected() {
		let peer = SecretKey::random(&mut OsRng);
		let keys = Keys {
			p256dh: URL_SAFE_NO_PAD.encode(encode_public_point(&peer)),
			auth: URL_SAFE_NO_PAD.encode([9u8; 10]),
		};
		assert!(ContentEncryptor::new(&keys).is_err());
	}
}
