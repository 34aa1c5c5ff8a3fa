//! Utility functions for the search indexer repository.

/// Whether a request or bulk item answered with `status` may succeed if sent again.
///
/// Throttling (429) and server-side errors (5xx) are transient; every other
/// failure status describes a problem with the request itself.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Whether `status` is a 2xx success.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_success_statuses() {
        assert!(is_success_status(200));
        assert!(is_success_status(201));
        assert!(!is_success_status(409));
    }
}
