//! Short code generation
//!
//! Allocates candidate codes from a URL-safe alphabet and checks them for
//! uniqueness against all existing links, active and deactivated. The
//! generator itself persists nothing; the caller creates the link record.

use thiserror::Error;

use crate::storage;
use crate::storage::Storage;

/// URL-safe, case-sensitive alphabet
///
/// Excludes the visually ambiguous `0 O 1 I l`
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Default code length
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Number of fresh draws before giving up on a length
const MAX_ATTEMPTS: usize = 5;

/// Code generation errors
#[derive(Debug, Error)]
pub enum Error {
    /// No free code found within the attempt budget
    ///
    /// The caller should retry with a longer code length
    #[error("No free code of length {length} found, retry with a longer code")]
    SpaceExhausted {
        /// The length that could not yield a free code
        length: usize,
    },

    /// The uniqueness check could not be performed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Draw a random code of the requested length
fn random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Generate a unique short code
///
/// Draws up to [`MAX_ATTEMPTS`] random codes and returns the first one no
/// existing link uses. Fails with [`Error::SpaceExhausted`] when the
/// alphabet/length combination is too crowded.
pub async fn generate_code<S: Storage>(storage: &S, length: usize) -> Result<String, Error> {
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code(length);

        if !storage.code_exists(&code).await? {
            return Ok(code);
        }
    }

    Err(Error::SpaceExhausted { length })
}

#[cfg(test)]
mod tests {
    use crate::storage::CreateLinkValues;
    use crate::storage::CreateProjectValues;
    use crate::storage::Memory;

    use super::*;

    #[test]
    fn test_random_code_length_and_alphabet() {
        for length in [1, 6, 12] {
            let code = random_code(length);

            assert_eq!(length, code.len());
            assert!(code.bytes().all(|byte| ALPHABET.contains(&byte)));
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for ambiguous in b"0O1Il" {
            assert!(!ALPHABET.contains(ambiguous));
        }
    }

    #[tokio::test]
    async fn test_generate_code_unique_against_existing_links() {
        let storage = Memory::new();

        let code = generate_code(&storage, DEFAULT_CODE_LENGTH).await.unwrap();

        assert_eq!(DEFAULT_CODE_LENGTH, code.len());
        assert!(!storage.code_exists(&code).await.unwrap());
    }

    #[tokio::test]
    async fn test_generate_code_space_exhausted() {
        let storage = Memory::new();

        let project = storage
            .create_project(&CreateProjectValues {
                name: "Example",
                ios_url: Some("https://apps.apple.com/app/id123"),
                android_url: None,
                fallback_url: None,
            })
            .await
            .unwrap();

        // claim every single-character code
        for byte in ALPHABET {
            let code = (*byte as char).to_string();

            storage
                .create_link(&CreateLinkValues {
                    project: &project,
                    code: &code,
                    expires_at: None,
                })
                .await
                .unwrap();
        }

        let result = generate_code(&storage, 1).await;

        assert!(matches!(result, Err(Error::SpaceExhausted { length: 1 })));
    }
}
