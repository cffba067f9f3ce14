use roost_api::errors::{ActorError, MessageError};
use std::error::Error;
use anyhow::anyhow;

#[cfg(test)]
mod tests {
    use super::*;

    // Test illegal payload error
    #[test]
    fn test_illegal_payload_error() {
        let error = MessageError::IllegalPayload("alloc::vec::Vec<u8>".to_string());

        assert_eq!(error.to_string(), "Illegal payload: alloc::vec::Vec<u8>");
        assert!(error.source().is_none());
    }

    // Test type mismatch error
    #[test]
    fn test_type_mismatch_error() {
        let error = MessageError::TypeMismatch { expected: "i32", found: "str" };

        assert_eq!(error.to_string(), "Payload type mismatch: expected i32, found str");
    }

    // Test that message errors pass through actor errors unchanged
    #[test]
    fn test_message_error_is_transparent() {
        let error: ActorError = MessageError::MissingDestination.into();

        assert_eq!(error.to_string(), "Message has no destination");
        assert!(matches!(error, ActorError::Message(MessageError::MissingDestination)));
    }

    // Test unhandled error
    #[test]
    fn test_unhandled_error() {
        let error = ActorError::Unhandled(42);

        assert_eq!(error.to_string(), "Unhandled message with tag 42");
    }

    // Test panic and thread fatal errors
    #[test]
    fn test_panic_errors() {
        assert_eq!(ActorError::Panic("boom".into()).to_string(), "Actor panicked: boom");
        assert_eq!(
            ActorError::ThreadFatal("loop died".into()).to_string(),
            "Worker thread failed: loop died"
        );
    }

    // Test conversion from anyhow
    #[test]
    fn test_other_error_from_anyhow() {
        fn handler() -> Result<(), ActorError> {
            Err(anyhow!("database unavailable"))?;
            Ok(())
        }

        let error = handler().unwrap_err();
        assert_eq!(error.to_string(), "database unavailable");
        assert!(matches!(error, ActorError::Other(_)));
    }
}
