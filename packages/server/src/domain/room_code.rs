//! Room code value object.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Alphabet for room codes. Visually confusable characters (I, O, 0, 1)
/// are excluded so codes survive being read out loud or typed from a
/// projector.
pub const CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed room code length.
pub const CODE_LEN: usize = 6;

/// Human-typable identifier of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCodeError {
    #[error("room code must be {CODE_LEN} characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid character '{0}' in room code")]
    InvalidCharacter(char),
}

impl RoomCode {
    /// Parse a code typed by a client. Input is trimmed and uppercased
    /// before validation, so `"ab2cd3 "` and `"AB2CD3"` are the same room.
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let normalized = value.trim().to_uppercase();
        if normalized.len() != CODE_LEN {
            return Err(RoomCodeError::InvalidLength(normalized.len()));
        }
        if let Some(ch) = normalized.chars().find(|ch| !CODE_ALPHABET.contains(*ch)) {
            return Err(RoomCodeError::InvalidCharacter(ch));
        }
        Ok(Self(normalized))
    }

    /// Generate a random code. Uniqueness against the live room table is
    /// the registry's job, not this function's.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let alphabet: Vec<char> = CODE_ALPHABET.chars().collect();
        let code: String = (0..CODE_LEN)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        // given / when:
        let code = RoomCode::parse(" ab2cd3 ").unwrap();

        // then:
        assert_eq!(code.as_str(), "AB2CD3");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            RoomCode::parse("ABC"),
            Err(RoomCodeError::InvalidLength(3))
        );
        assert_eq!(
            RoomCode::parse(""),
            Err(RoomCodeError::InvalidLength(0))
        );
    }

    #[test]
    fn test_parse_rejects_confusable_characters() {
        // 0, 1, I and O are not part of the alphabet
        assert_eq!(
            RoomCode::parse("AB0CD3"),
            Err(RoomCodeError::InvalidCharacter('0'))
        );
        assert_eq!(
            RoomCode::parse("ABICD3"),
            Err(RoomCodeError::InvalidCharacter('I'))
        );
    }

    #[test]
    fn test_random_codes_are_valid() {
        // given:
        let mut rng = rand::thread_rng();

        // when / then:
        for _ in 0..100 {
            let code = RoomCode::random(&mut rng);
            assert!(RoomCode::parse(code.as_str()).is_ok());
        }
    }
}
