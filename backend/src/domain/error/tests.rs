//! Tests for domain error codes and messages.

use rstest::rstest;

use super::*;

#[rstest]
#[case::format(Error::invalid_format("bad"), ErrorCode::InvalidRequest)]
#[case::geometry(Error::from(GeometryError::UnclosedRing), ErrorCode::InvalidRequest)]
#[case::missing(Error::not_found(EnvironmentId::new(4)), ErrorCode::NotFound)]
#[case::conflict(
    Error::Conflict { id: EnvironmentId::new(4), expected: 2, actual: 3 },
    ErrorCode::Conflict
)]
#[case::zone_store(
    Error::from(ZoneRepositoryError::connection("refused")),
    ErrorCode::ServiceUnavailable
)]
fn codes_follow_failure_category(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn geometry_errors_surface_verbatim() {
    let error = Error::from(GeometryError::UnclosedRing);
    assert_eq!(error.to_string(), GeometryError::UnclosedRing.to_string());
}

#[rstest]
fn persistence_errors_keep_adapter_message() {
    let error = Error::from(PoiRepositoryError::query("relation \"poi\" does not exist"));
    assert!(error.to_string().contains("relation \"poi\" does not exist"));
}

#[rstest]
fn error_codes_serialise_in_snake_case() {
    let json = serde_json::to_string(&ErrorCode::ServiceUnavailable).expect("serialise code");
    assert_eq!(json, "\"service_unavailable\"");
}

#[rstest]
fn revision_mismatch_becomes_conflict() {
    let error = Error::from(EnvironmentRepositoryError::revision_mismatch(
        EnvironmentId::new(9),
        1_u32,
        2_u32,
    ));
    assert_eq!(
        error,
        Error::Conflict {
            id: EnvironmentId::new(9),
            expected: 1,
            actual: 2,
        }
    );
}

#[rstest]
fn missing_environment_row_becomes_not_found() {
    let error = Error::from(EnvironmentRepositoryError::not_found(EnvironmentId::new(9)));
    assert_eq!(error.code(), ErrorCode::NotFound);
}
