//! Input validation shared by `chat` and `group_send`.

use crate::config::MAX_MESSAGE_CHARS;
use crate::error::GatewayError;

/// Trim a user message and check it is non-empty and within
/// [`MAX_MESSAGE_CHARS`] characters.
pub fn validate_message(message: &str) -> Result<&str, GatewayError> {
    let trimmed = message.trim();

    if trimmed.is_empty() {
        return Err(GatewayError::InvalidInput(
            "message cannot be empty".to_string(),
        ));
    }

    let chars = trimmed.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(GatewayError::InvalidInput(format!(
            "message is {} characters, the limit is {}",
            chars, MAX_MESSAGE_CHARS
        )));
    }

    Ok(trimmed)
}

/// Check an identifier supplied by the caller is not blank.
pub(crate) fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bounds() {
        assert!(validate_message(&"a".repeat(1000)).is_ok());
        assert!(matches!(
            validate_message(&"a".repeat(1001)),
            Err(GatewayError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_message_is_trimmed() {
        assert_eq!(validate_message("  hello \n").unwrap(), "hello");
        let padded = format!("   {}   ", "b".repeat(1000));
        assert_eq!(validate_message(&padded).unwrap().len(), 1000);
    }

    #[test]
    fn test_blank_messages_rejected() {
        for message in ["", "   ", "\n\t"] {
            assert!(matches!(
                validate_message(message),
                Err(GatewayError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_length_counts_characters() {
        // 1000 multi-byte characters are still within the limit.
        assert!(validate_message(&"é".repeat(1000)).is_ok());
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("senderId", " u-1 ").unwrap(), "u-1");
        assert!(require_id("senderId", " ").is_err());
    }
}
