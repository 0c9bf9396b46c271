use super::*;
use serde_json::json;

// =============================================================================
// SESSION KIND
// =============================================================================

#[test]
fn kind_parses_case_insensitively() {
    assert_eq!("restaurant".parse::<SessionKind>().unwrap(), SessionKind::Restaurant);
    assert_eq!("Fair".parse::<SessionKind>().unwrap(), SessionKind::Fair);
    assert_eq!("RESTAURANT".parse::<SessionKind>().unwrap(), SessionKind::Restaurant);
}

#[test]
fn unknown_kind_is_an_error() {
    let err = "museum".parse::<SessionKind>().unwrap_err();
    assert!(err.to_string().contains("museum"));
}

#[test]
fn kind_round_trips_through_as_str() {
    for kind in [SessionKind::Restaurant, SessionKind::Fair] {
        assert_eq!(kind.as_str().parse::<SessionKind>().unwrap(), kind);
    }
}

// =============================================================================
// EXPERIENCE STATUS
// =============================================================================

#[test]
fn status_advances_forward() {
    let status = ExperienceStatus::Beginning;
    let status = status.advance_to(ExperienceStatus::Ongoing).unwrap();
    let status = status.advance_to(ExperienceStatus::Ended).unwrap();
    assert_eq!(status, ExperienceStatus::Ended);
}

#[test]
fn status_never_moves_backward() {
    let err = ExperienceStatus::Ended
        .advance_to(ExperienceStatus::Ongoing)
        .unwrap_err();
    assert_eq!(err.from, ExperienceStatus::Ended);
    assert_eq!(err.to, ExperienceStatus::Ongoing);

    assert!(
        ExperienceStatus::Ongoing
            .advance_to(ExperienceStatus::Beginning)
            .is_err()
    );
}

#[test]
fn status_advance_to_self_is_a_no_op() {
    let status = ExperienceStatus::Ongoing;
    assert_eq!(status.advance_to(status).unwrap(), status);
}

#[test]
fn status_serializes_screaming() {
    let json = serde_json::to_value(ExperienceStatus::Beginning).unwrap();
    assert_eq!(json, json!("BEGINNING"));
    let parsed: ExperienceStatus = serde_json::from_value(json!("ENDED")).unwrap();
    assert_eq!(parsed, ExperienceStatus::Ended);
}

// =============================================================================
// BACKEND JSON SHAPES
// =============================================================================

#[test]
fn school_classes_live_under_the_class_key() {
    let school: SchoolWithClasses = serde_json::from_value(json!({
        "id": "d96d5d38-6c73-4420-ba86-c994eac336fb",
        "name": "Escola Azul",
        "cityId": "7e57d004-2b97-0e7a-b45f-5387367791cd",
        "Class": [
            { "id": "9c5b94b1-35ad-49bb-b118-8e8fc24abf80", "name": "5A", "grade": 5 }
        ]
    }))
    .unwrap();

    assert_eq!(school.classes.len(), 1);
    assert_eq!(school.classes[0].name, "5A");
    assert_eq!(school.classes[0].grade, 5);
}

#[test]
fn school_without_classes_defaults_to_empty() {
    let school: SchoolWithClasses = serde_json::from_value(json!({
        "id": "d96d5d38-6c73-4420-ba86-c994eac336fb",
        "name": "Escola Azul",
        "cityId": "7e57d004-2b97-0e7a-b45f-5387367791cd"
    }))
    .unwrap();

    assert!(school.classes.is_empty());
}

#[test]
fn experience_decodes_camel_case_payload() {
    let experience: Experience = serde_json::from_value(json!({
        "id": "9c5b94b1-35ad-49bb-b118-8e8fc24abf80",
        "name": "Feira da 5A",
        "classId": "7e57d004-2b97-0e7a-b45f-5387367791cd",
        "userId": "d96d5d38-6c73-4420-ba86-c994eac336fb",
        "pin": "123456",
        "templateName": "fair",
        "createdAt": "2025-05-02T14:00:00.000Z"
    }))
    .unwrap();

    assert_eq!(experience.pin, "123456");
    assert_eq!(experience.status, ExperienceStatus::Beginning);
    assert!(experience.students.is_empty());
    assert_eq!(experience.kind().unwrap(), SessionKind::Fair);
}

#[test]
fn experience_kind_rejects_unknown_template() {
    let experience: Experience = serde_json::from_value(json!({
        "id": "9c5b94b1-35ad-49bb-b118-8e8fc24abf80",
        "name": "Teste",
        "classId": "7e57d004-2b97-0e7a-b45f-5387367791cd",
        "userId": "d96d5d38-6c73-4420-ba86-c994eac336fb",
        "pin": "000000",
        "templateName": "museum",
        "createdAt": "2025-05-02T14:00:00.000Z"
    }))
    .unwrap();

    assert!(experience.kind().is_err());
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Npc).unwrap(), json!("npc"));
    let role: Role = serde_json::from_value(json!("student")).unwrap();
    assert_eq!(role, Role::Student);
}
