//! Login password derivation.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::auth::tokens::{ApplicationToken, Challenge};

type HmacSha1 = Hmac<Sha1>;

/// Derives the login password for one challenge.
///
/// `hex(HMAC-SHA1(key = app_token, message = challenge))`. The challenge is
/// consumed; each login needs a fresh one.
#[must_use]
pub fn derive_password(app_token: &ApplicationToken, challenge: Challenge) -> String {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha1::new_from_slice(app_token.as_bytes()) else {
        unreachable!("HMAC-SHA1 accepts keys of any length")
    };
    mac.update(challenge.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
