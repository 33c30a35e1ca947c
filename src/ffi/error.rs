//! Status reporting across the FFI boundary.

use crate::error::Result;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

pub use crate::error::SecurityStatus;

/// Run `f` and collapse its outcome to a status code.
///
/// A panic inside `f` is caught and reported as `SecurityStatus::Error`; it
/// never unwinds into C.
pub(crate) fn guard(f: impl FnOnce() -> Result<()>) -> SecurityStatus {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => SecurityStatus::from(result),
        Err(_) => {
            error!("panic caught at FFI boundary");
            SecurityStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecurityError;
    use crate::keystore::KeyStoreError;

    #[test]
    fn test_guard_maps_results() {
        assert_eq!(guard(|| Ok(())), SecurityStatus::Ok);
        assert_eq!(
            guard(|| Err(SecurityError::invalid_input("x"))),
            SecurityStatus::InvalidInputParams
        );
        assert_eq!(
            guard(|| Err(KeyStoreError::NotFound("k".into()).into())),
            SecurityStatus::InvalidKeyIndex
        );
    }

    #[test]
    fn test_guard_catches_panic() {
        let status = guard(|| panic!("boom"));
        assert_eq!(status, SecurityStatus::Error);
    }

    #[test]
    fn test_status_values_are_stable() {
        assert_eq!(SecurityStatus::Ok as i32, 0);
        assert_eq!(SecurityStatus::Error as i32, 1);
        assert_eq!(SecurityStatus::InvalidInputParams as i32, 2);
        assert_eq!(SecurityStatus::InvalidKeyIndex as i32, 3);
    }
}
