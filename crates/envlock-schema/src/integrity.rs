use sha1::{Digest, Sha1};
use thiserror::Error;

/// Marker prefix of the digest line embedded at the top of every lock
/// artifact.
pub const ENVHASH_SIGIL: &str = "# ENVHASH:";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("no '# ENVHASH:' signature line found")]
    MissingSignature,
}

/// SHA-1 hex digest over the raw bytes of a manifest.
///
/// The digest binds a lock artifact to the exact manifest bytes that produced
/// it. No normalization happens first, so whitespace and comments count.
pub fn manifest_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Prepend the signature line to a serialized artifact body.
pub fn embed_digest(digest: &str, body: &str) -> String {
    format!("{ENVHASH_SIGIL}{digest}\n{body}")
}

/// Extract the embedded digest from lock artifact text.
///
/// Every line is scanned; the first whose start (after leading whitespace) is
/// the sigil wins. The trailing token is trimmed, which also tolerates the
/// space between sigil and digest that older writers emitted.
pub fn extract_digest(text: &str) -> Result<String, SignatureError> {
    text.lines()
        .find_map(|line| line.trim_start().strip_prefix(ENVHASH_SIGIL))
        .map(|rest| rest.trim().to_owned())
        .ok_or(SignatureError::MissingSignature)
}
