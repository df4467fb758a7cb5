use super::common::*;
use crate::records::{PaymentKind, StudentId};
use crate::workflows::enrollment::draft::{EnrollmentDraft, EnrollmentKind};
use crate::workflows::enrollment::payments::PaymentDraft;
use crate::workflows::enrollment::validate::{validate_step, WizardStep};
use rust_decimal::Decimal;

#[tokio::test]
async fn empty_identity_collects_field_errors() {
    let students = MemoryStudents::default();
    let draft = EnrollmentDraft::new();

    let errors = validate_step(&draft, WizardStep::Student, &students)
        .await
        .expect("validation runs");

    for field in ["nombres", "apellidos", "dni", "fecha_nacimiento", "telefono"] {
        assert!(errors.get(field).is_some(), "missing error for {field}");
    }
}

#[tokio::test]
async fn malformed_dni_and_phone_are_rejected() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.set_identity_field("dni", "123");
    draft.set_identity_field("telefono", "12ab5678x");

    let errors = validate_step(&draft, WizardStep::Student, &students)
        .await
        .expect("validation runs");

    assert_eq!(errors.get("dni"), Some("El DNI debe tener 8 dígitos"));
    assert_eq!(errors.get("telefono"), Some("El teléfono debe tener 9 dígitos"));
}

#[tokio::test]
async fn dni_owned_by_another_student_blocks_step_one() {
    let students = MemoryStudents::with_student(sample_student(5, "12345678"));
    let mut draft = complete_draft();

    let advanced = draft.try_advance(&students).await.expect("lookup runs");

    assert!(!advanced);
    assert_eq!(draft.step, WizardStep::Student);
    assert_eq!(draft.errors.get("dni"), Some("Ya existe un alumno con este DNI"));
}

#[tokio::test]
async fn matching_existing_student_id_passes_the_dni_check() {
    let students = MemoryStudents::with_student(sample_student(5, "12345678"));
    let mut draft = complete_draft();
    draft.is_existing_student = true;
    draft.existing_student_id = Some(StudentId(5));

    let advanced = draft.try_advance(&students).await.expect("lookup runs");

    assert!(advanced);
    assert_eq!(draft.step, WizardStep::Academic);
    assert!(draft.errors.is_empty());
}

#[tokio::test]
async fn plan_branch_requires_the_full_hierarchy() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.set_course(crate::catalog::CourseId(2)); // clears level and cycle

    let errors = validate_step(&draft, WizardStep::Academic, &students)
        .await
        .expect("validation runs");

    assert!(errors.get("level").is_some());
    assert!(errors.get("cycle").is_some());
    assert!(errors.get("plan").is_none());
}

#[tokio::test]
async fn product_branch_requires_exam_date_when_flagged() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.set_kind(EnrollmentKind::Product);
    draft.set_product(&exam_product());

    let errors = validate_step(&draft, WizardStep::Academic, &students)
        .await
        .expect("validation runs");

    assert!(errors.get("exam_date").is_some());
    assert!(errors.get("plan").is_none(), "plan fields do not apply to products");

    draft.set_exam_date(today());
    let errors = validate_step(&draft, WizardStep::Academic, &students)
        .await
        .expect("validation runs");
    assert!(errors.is_empty());
}

#[tokio::test]
async fn payments_step_requires_at_least_one_row() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.payments.clear();

    let errors = validate_step(&draft, WizardStep::Payments, &students)
        .await
        .expect("validation runs");

    assert_eq!(errors.get("pagos"), Some("Agregue al menos un pago"));
}

#[tokio::test]
async fn duplicate_payment_kinds_are_rejected() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.add_payment(PaymentDraft::new(PaymentKind::Materiales, Decimal::from(80)));

    let errors = validate_step(&draft, WizardStep::Payments, &students)
        .await
        .expect("validation runs");

    assert!(errors
        .get("pagos")
        .is_some_and(|message| message.contains("duplicado")));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected_per_row() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.payments[1].monto = Decimal::ZERO;

    let errors = validate_step(&draft, WizardStep::Payments, &students)
        .await
        .expect("validation runs");

    assert_eq!(
        errors.get("pagos.1.monto"),
        Some("El monto debe ser mayor a cero")
    );
}

#[tokio::test]
async fn new_students_need_an_inscription_payment() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.payments.retain(|payment| payment.kind != PaymentKind::Inscripcion);

    let errors = validate_step(&draft, WizardStep::Payments, &students)
        .await
        .expect("validation runs");

    assert!(errors
        .get("pagos")
        .is_some_and(|message| message.contains("Inscripción")));
}

#[tokio::test]
async fn existing_students_skip_the_inscription_requirement() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();
    draft.is_existing_student = true;
    draft.existing_student_id = Some(StudentId(5));
    draft.payments.retain(|payment| payment.kind == PaymentKind::Mensualidad);

    let errors = validate_step(&draft, WizardStep::Payments, &students)
        .await
        .expect("validation runs");

    assert!(errors.is_empty());
}

#[tokio::test]
async fn wizard_walks_all_four_steps_linearly() {
    let students = MemoryStudents::default();
    let mut draft = complete_draft();

    for expected in [
        WizardStep::Academic,
        WizardStep::Payments,
        WizardStep::Review,
    ] {
        assert!(draft.try_advance(&students).await.expect("advance runs"));
        assert_eq!(draft.step, expected);
    }

    // Review is terminal; advancing validates everything but stays put.
    assert!(draft.try_advance(&students).await.expect("advance runs"));
    assert_eq!(draft.step, WizardStep::Review);

    draft.step_back();
    assert_eq!(draft.step, WizardStep::Payments);
}
