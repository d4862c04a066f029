//! Error module tests

use crate::application::errors::ValidationErrors;
use crate::error::Error;

#[test]
fn test_timebox_not_found_error() {
    let error = Error::TimeboxNotFound("tb-9".to_string());
    assert_eq!(error.code(), "E001");
    assert_eq!(
        error.suggestion(),
        Some("timebox timeboxes list".to_string())
    );
    assert!(error.to_string().contains("tb-9"));
}

#[test]
fn test_project_not_found_error() {
    let error = Error::ProjectNotFound("intranet".to_string());
    assert_eq!(error.code(), "E002");
    assert_eq!(error.suggestion(), Some("timebox projects list".to_string()));
}

#[test]
fn test_api_error() {
    let error = Error::api(409, "Role already assigned");
    assert_eq!(error.code(), "E101");
    assert_eq!(error.suggestion(), None);
    assert!(error.to_string().contains("409"));
    assert!(error.to_string().contains("Role already assigned"));
    assert!(!error.is_client_side());
}

#[test]
fn test_auth_errors_point_to_login() {
    for error in [Error::Unauthorized, Error::NotAuthenticated] {
        assert_eq!(error.suggestion(), Some("timebox login".to_string()));
    }
    assert_eq!(Error::Unauthorized.code(), "E150");
    assert!(Error::NotAuthenticated.is_client_side());
}

#[test]
fn test_validation_errors_convert() {
    let mut errors = ValidationErrors::new();
    errors.add("close.cumplimiento", "Fulfilment is required");
    let error: Error = errors.into();

    assert_eq!(error.code(), "E800");
    assert!(error.is_client_side());
    assert!(error.to_string().contains("close.cumplimiento"));
}

#[test]
fn test_invalid_transition_message() {
    let error = Error::InvalidTransition {
        entity: "payment order".to_string(),
        from: "Pagada".to_string(),
        to: "Pendiente".to_string(),
    };
    assert_eq!(error.code(), "E803");
    assert_eq!(
        error.to_string(),
        "Cannot move payment order from 'Pagada' to 'Pendiente'"
    );
}

#[test]
fn test_business_rule_is_client_side() {
    let error = Error::BusinessRule("You already applied".to_string());
    assert_eq!(error.code(), "E802");
    assert!(error.is_client_side());
    assert_eq!(error.to_string(), "You already applied");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: Error = io.into();
    assert_eq!(error.code(), "E9999");
}
