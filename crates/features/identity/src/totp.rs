//! RFC 6238 time-based one-time passwords (HMAC-SHA1, 6 digits, 30 second step).

use cardly_kernel::validation::percent_encode;
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

pub const STEP_SECONDS: i64 = 30;
pub const DIGITS: u32 = 6;
pub const SECRET_BYTES: usize = 20;
/// Accepted clock drift, in steps on either side.
pub const WINDOW: i64 = 1;

/// A fresh random secret, base32 encoded without padding.
#[must_use]
pub fn generate_secret() -> String {
    let mut secret = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut secret);
    BASE32_NOPAD.encode(&secret)
}

/// The code for one counter value (RFC 4226 dynamic truncation).
#[must_use]
pub fn hotp(secret: &[u8], counter: u64) -> u32 {
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(secret) else {
        return 0;
    };
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    binary % 10u32.pow(DIGITS)
}

/// The code valid at `timestamp`, zero padded.
#[must_use]
pub fn code_at(secret_b32: &str, timestamp: i64) -> Option<String> {
    let secret = BASE32_NOPAD.decode(secret_b32.as_bytes()).ok()?;
    let counter = u64::try_from(timestamp.div_euclid(STEP_SECONDS)).ok()?;
    Some(format!("{:0width$}", hotp(&secret, counter), width = DIGITS as usize))
}

/// Checks `code` against the steps around `now`.
#[must_use]
pub fn verify(secret_b32: &str, code: &str, now: i64) -> bool {
    let code = code.trim();
    if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    (-WINDOW..=WINDOW).any(|drift| {
        code_at(secret_b32, now + drift * STEP_SECONDS).is_some_and(|expected| expected == code)
    })
}

/// Provisioning URI understood by authenticator apps.
#[must_use]
pub fn otpauth_uri(issuer: &str, account: &str, secret_b32: &str) -> String {
    let issuer = percent_encode(issuer);
    format!(
        "otpauth://totp/{issuer}:{}?secret={secret_b32}&issuer={issuer}&algorithm=SHA1&digits={DIGITS}&period={STEP_SECONDS}",
        percent_encode(account),
    )
}
