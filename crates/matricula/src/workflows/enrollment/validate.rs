//! Per-step validation for the wizard. Steps advance linearly; a failed
//! check fills a field-keyed error map and blocks the transition without
//! touching the rest of the draft.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::PaymentKind;

use super::draft::{EnrollmentDraft, EnrollmentKind};
use super::gateway::{GatewayError, StudentGateway};

/// Field-keyed error map surfaced next to the offending inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn clear_field(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// The four wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Student,
    Academic,
    Payments,
    Review,
}

impl WizardStep {
    pub const fn number(self) -> u8 {
        match self {
            WizardStep::Student => 1,
            WizardStep::Academic => 2,
            WizardStep::Payments => 3,
            WizardStep::Review => 4,
        }
    }

    pub const fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Student => Some(WizardStep::Academic),
            WizardStep::Academic => Some(WizardStep::Payments),
            WizardStep::Payments => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    pub const fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Student => None,
            WizardStep::Academic => Some(WizardStep::Student),
            WizardStep::Payments => Some(WizardStep::Academic),
            WizardStep::Review => Some(WizardStep::Payments),
        }
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Synchronous identity checks; the DNI-uniqueness lookup happens in
/// [`validate_step`].
fn validate_identity(draft: &EnrollmentDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let student = &draft.student;

    if student.nombres.trim().is_empty() {
        errors.insert("nombres", "Ingrese los nombres");
    }
    if student.apellidos.trim().is_empty() {
        errors.insert("apellidos", "Ingrese los apellidos");
    }
    if !is_digits(student.dni.trim(), 8) {
        errors.insert("dni", "El DNI debe tener 8 dígitos");
    }
    if student.fecha_nacimiento.is_none() {
        errors.insert("fecha_nacimiento", "Ingrese la fecha de nacimiento");
    }
    if !is_digits(student.telefono.trim(), 9) {
        errors.insert("telefono", "El teléfono debe tener 9 dígitos");
    }
    if !student.email.trim().is_empty() && !looks_like_email(student.email.trim()) {
        errors.insert("email", "Ingrese un correo válido");
    }

    errors
}

fn validate_academic(draft: &EnrollmentDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if draft.campus.is_none() {
        errors.insert("campus", "Seleccione una sede");
    }

    match draft.kind {
        EnrollmentKind::Plan => {
            if draft.plan.is_none() {
                errors.insert("plan", "Seleccione un plan");
            }
            if draft.course.is_none() {
                errors.insert("course", "Seleccione un curso");
            }
            if draft.level.is_none() {
                errors.insert("level", "Seleccione un nivel");
            }
            if draft.cycle.is_none() {
                errors.insert("cycle", "Seleccione un ciclo");
            }
            if draft.schedule.as_deref().map_or(true, str::is_empty) {
                errors.insert("schedule", "Seleccione un horario");
            }
        }
        EnrollmentKind::Product => {
            if draft.product.is_none() {
                errors.insert("product", "Seleccione un producto");
            }
            if let Some(requirements) = draft.product_requirements {
                if requirements.requires_exam_date && draft.exam_date.is_none() {
                    errors.insert("exam_date", "Seleccione la fecha de examen");
                }
                if requirements.requires_schedule
                    && draft.schedule.as_deref().map_or(true, str::is_empty)
                {
                    errors.insert("schedule", "Seleccione un horario");
                }
            }
        }
    }

    errors
}

fn validate_payments(draft: &EnrollmentDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if draft.payments.is_empty() {
        errors.insert("pagos", "Agregue al menos un pago");
        return errors;
    }

    let mut seen: Vec<PaymentKind> = Vec::new();
    for (index, payment) in draft.payments.iter().enumerate() {
        if seen.contains(&payment.kind) {
            errors.insert(
                "pagos",
                format!("Tipo de pago duplicado: {}", payment.kind.label()),
            );
        }
        seen.push(payment.kind);

        if payment.monto <= rust_decimal::Decimal::ZERO {
            errors.insert(
                format!("pagos.{index}.monto"),
                "El monto debe ser mayor a cero",
            );
        }
    }

    if !draft.is_existing_student && !seen.contains(&PaymentKind::Inscripcion) {
        errors.insert("pagos", "Un alumno nuevo requiere un pago de Inscripción");
    }

    errors
}

/// Validate one step. Only step 1 touches the network: it asks the student
/// directory whether another student already owns the draft's DNI.
pub async fn validate_step(
    draft: &EnrollmentDraft,
    step: WizardStep,
    students: &dyn StudentGateway,
) -> Result<ValidationErrors, GatewayError> {
    match step {
        WizardStep::Student => {
            let mut errors = validate_identity(draft);
            if errors.get("dni").is_none() {
                if let Some(owner) = students.find_by_dni(draft.student.dni.trim()).await? {
                    if draft.existing_student_id != Some(owner.id) {
                        errors.insert("dni", "Ya existe un alumno con este DNI");
                    }
                }
            }
            Ok(errors)
        }
        WizardStep::Academic => Ok(validate_academic(draft)),
        WizardStep::Payments => Ok(validate_payments(draft)),
        WizardStep::Review => {
            let mut errors = validate_identity(draft);
            if errors.get("dni").is_none() {
                if let Some(owner) = students.find_by_dni(draft.student.dni.trim()).await? {
                    if draft.existing_student_id != Some(owner.id) {
                        errors.insert("dni", "Ya existe un alumno con este DNI");
                    }
                }
            }
            errors.merge(validate_academic(draft));
            errors.merge(validate_payments(draft));
            Ok(errors)
        }
    }
}

impl EnrollmentDraft {
    /// Validate the current step and advance on success. Returns whether the
    /// wizard moved; on failure the error map is stored on the draft.
    pub async fn try_advance(
        &mut self,
        students: &dyn StudentGateway,
    ) -> Result<bool, GatewayError> {
        let errors = validate_step(self, self.step, students).await?;
        if errors.is_empty() {
            self.errors = ValidationErrors::default();
            if let Some(next) = self.step.next() {
                self.step = next;
            }
            Ok(true)
        } else {
            self.errors = errors;
            Ok(false)
        }
    }

    /// Stepping back never re-validates.
    pub fn step_back(&mut self) {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
    }
}
