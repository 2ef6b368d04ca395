//! Error-code classification table
//!
//! Alicloud APIs report failures with a structured `Code` (RPC) or
//! `ErrorCode` (ROA) field. This module is the single place that decides
//! whether such a code means the entity is missing, the call may be
//! retried, or the failure is final.
//!
//! | class         | codes                                                            |
//! |---------------|------------------------------------------------------------------|
//! | NotFound      | `EntityNotExist.*`, `ServiceNotFound`, `FunctionNotFound`, `TriggerNotFound` |
//! | Transient     | `Throttling`, `Throttling.*`, `ServiceUnavailable`, `InternalError`, `InternalServerError`, `ResourceThrottled`, `ConcurrentUpdateError`, `OperationConflict` |
//! | NonTransient  | anything else                                                    |
//!
//! When a response carries no code, the HTTP status decides: 404 is
//! NotFound, 429 and 5xx are Transient, everything else is NonTransient.

use crate::error::ErrorClass;

/// Codes meaning the addressed entity does not exist
const NOT_FOUND_CODES: &[&str] = &["ServiceNotFound", "FunctionNotFound", "TriggerNotFound"];

/// Code prefixes meaning the addressed entity does not exist
const NOT_FOUND_PREFIXES: &[&str] = &["EntityNotExist."];

/// Codes meaning the call may succeed if repeated later
const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ServiceUnavailable",
    "InternalError",
    "InternalServerError",
    "ResourceThrottled",
    "ConcurrentUpdateError",
    "OperationConflict",
];

/// Code prefixes meaning the call may succeed if repeated later
const TRANSIENT_PREFIXES: &[&str] = &["Throttling."];

/// Classify an Alicloud error code
pub fn classify_code(code: &str) -> ErrorClass {
    if NOT_FOUND_CODES.contains(&code) || NOT_FOUND_PREFIXES.iter().any(|p| code.starts_with(p)) {
        return ErrorClass::NotFound;
    }

    if TRANSIENT_CODES.contains(&code) || TRANSIENT_PREFIXES.iter().any(|p| code.starts_with(p)) {
        return ErrorClass::Transient;
    }

    ErrorClass::NonTransient
}

/// Classify a failed HTTP response from its error code, falling back to the status
pub fn classify_response(code: Option<&str>, status: u16) -> ErrorClass {
    if let Some(code) = code.filter(|c| !c.is_empty()) {
        return classify_code(code);
    }

    match status {
        404 => ErrorClass::NotFound,
        429 | 500..=599 => ErrorClass::Transient,
        _ => ErrorClass::NonTransient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_entity_codes_are_not_found() {
        assert_eq!(classify_code("EntityNotExist.User"), ErrorClass::NotFound);
        assert_eq!(classify_code("EntityNotExist.User.LoginProfile"), ErrorClass::NotFound);
        assert_eq!(classify_code("EntityNotExist.Role"), ErrorClass::NotFound);
    }

    #[test]
    fn fc_codes_are_not_found() {
        assert_eq!(classify_code("ServiceNotFound"), ErrorClass::NotFound);
        assert_eq!(classify_code("FunctionNotFound"), ErrorClass::NotFound);
    }

    #[test]
    fn throttling_and_server_errors_are_transient() {
        for code in [
            "Throttling",
            "Throttling.User",
            "Throttling.Api",
            "ServiceUnavailable",
            "InternalError",
            "ResourceThrottled",
            "ConcurrentUpdateError",
        ] {
            assert_eq!(classify_code(code), ErrorClass::Transient, "{code}");
        }
    }

    #[test]
    fn everything_else_is_final() {
        for code in [
            "EntityAlreadyExists.User.LoginProfile",
            "InvalidParameter.PasswordPolicy",
            "Forbidden.RAM",
            "FunctionAlreadyExists",
            "",
        ] {
            assert_eq!(classify_code(code), ErrorClass::NonTransient, "{code}");
        }
    }

    #[test]
    fn prefixes_must_match_whole_segments() {
        // "EntityNotExist" alone is not a RAM entity code
        assert_eq!(classify_code("EntityNotExist"), ErrorClass::NonTransient);
        assert_eq!(classify_code("ThrottlingPolicyInvalid"), ErrorClass::NonTransient);
    }

    #[test]
    fn status_decides_when_code_is_missing() {
        assert_eq!(classify_response(None, 404), ErrorClass::NotFound);
        assert_eq!(classify_response(None, 429), ErrorClass::Transient);
        assert_eq!(classify_response(None, 503), ErrorClass::Transient);
        assert_eq!(classify_response(None, 403), ErrorClass::NonTransient);
        assert_eq!(classify_response(Some(""), 502), ErrorClass::Transient);
    }

    #[test]
    fn code_wins_over_status() {
        assert_eq!(
            classify_response(Some("EntityNotExist.User"), 400),
            ErrorClass::NotFound
        );
        assert_eq!(
            classify_response(Some("InvalidParameter"), 500),
            ErrorClass::NonTransient
        );
    }
}
