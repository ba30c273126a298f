pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
