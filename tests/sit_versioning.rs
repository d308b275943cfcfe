//! Creating successive versions of the same SIT must assign strictly
//! incrementing version numbers, independent of other SITs' version
//! counters.

use dlp_scan::sit::repository::{create_sit, create_version, NewVersion};
use dlp_scan::sit::{PrimaryElement, SupportingLogic};

#[test]
fn version_numbers_increment_per_sit() {
    let mut conn = dlp_scan::db::open(":memory:").unwrap();

    let ssn = create_sit(&conn, "SSN", None).unwrap();
    let other = create_sit(&conn, "Unrelated", None).unwrap();

    let v1 = create_version(
        &mut conn,
        ssn.id,
        NewVersion {
            entity_type: Some("SSN".to_string()),
            confidence: None,
            source: None,
            primary_element: PrimaryElement::Regex(r"\d{3}-\d{2}-\d{4}".to_string()),
            supporting_logic: SupportingLogic::Any,
            supporting_groups: vec![],
        },
    )
    .unwrap();
    assert_eq!(v1.version_number, 1);

    let other_v1 = create_version(
        &mut conn,
        other.id,
        NewVersion {
            entity_type: None,
            confidence: None,
            source: None,
            primary_element: PrimaryElement::Keyword("foo".to_string()),
            supporting_logic: SupportingLogic::Any,
            supporting_groups: vec![],
        },
    )
    .unwrap();
    assert_eq!(other_v1.version_number, 1);

    let v2 = create_version(
        &mut conn,
        ssn.id,
        NewVersion {
            entity_type: Some("SSN".to_string()),
            confidence: None,
            source: None,
            primary_element: PrimaryElement::Regex(r"\d{3}-\d{2}-\d{4}".to_string()),
            supporting_logic: SupportingLogic::Any,
            supporting_groups: vec![],
        },
    )
    .unwrap();
    assert_eq!(v2.version_number, 2);
    assert_ne!(v1.id, v2.id);
}
