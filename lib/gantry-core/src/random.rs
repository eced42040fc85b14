use rand::Rng;
use rand::seq::IndexedRandom;

// Mixed-case on purpose: the generated string is lowercased afterwards, so the
// effective alphabet is 26 symbols. Downstream uniqueness assumptions are
// calibrated to that output; do not widen or narrow it.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a random string of `len` lowercase ASCII letters.
///
/// Used for resource-name suffixes; a 10-character suffix makes collision
/// across concurrent test runs negligible.
#[must_use]
pub fn rand_string(len: usize) -> String {
    rand_string_with(&mut rand::rng(), len)
}

/// Like [`rand_string`], drawing from the provided generator.
///
/// Deterministic tests can supply a seeded [`rand::rngs::StdRng`].
pub fn rand_string_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let raw: String = std::iter::repeat_with(|| ALPHABET.choose(rng).copied().unwrap_or(b'a'))
        .take(len)
        .map(char::from)
        .collect();
    raw.to_ascii_lowercase()
}
