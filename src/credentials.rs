//! Credential generation
//!
//! Passwords are drawn from a fixed printable alphabet using the
//! thread-local ChaCha-based generator, which is cryptographically secure
//! and seeded once per thread by the OS.

use rand::Rng;

/// Alphabet for generated passwords: letters, digits and a small symbol set
const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyz%()$#ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default length for generated database passwords
pub const DEFAULT_PASSWORD_LENGTH: usize = 26;

/// Generate a random password of the requested length
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        assert_eq!(generate_password(26).len(), 26);
        assert_eq!(generate_password(0).len(), 0);
    }

    #[test]
    fn stays_within_alphabet() {
        let passwd = generate_password(256);
        assert!(passwd.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn successive_calls_differ() {
        // 26 chars over a 67-symbol alphabet; a collision means the
        // generator is not advancing.
        assert_ne!(generate_password(26), generate_password(26));
    }
}
