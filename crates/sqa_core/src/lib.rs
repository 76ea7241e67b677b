pub mod digest;
pub mod domain;
pub mod error;
pub mod export;
pub mod gates;
pub mod ingest;
pub mod normalize;
pub mod pricing;
pub mod run;
pub mod store;

#[cfg(test)]
mod tests {
    use super::error::{AppError, ErrorKind};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::conflict("RUN_TEST", "run failed")
            .with_details("run_id=r1")
            .with_retryable(false);
        assert_eq!(err.kind, ErrorKind::StateConflict);
        assert_eq!(err.code, "RUN_TEST");
        assert_eq!(err.message, "run failed");
        assert!(!err.retryable);
        assert_eq!(err.to_string(), "[RUN_TEST] run failed (run_id=r1)");
    }
}
