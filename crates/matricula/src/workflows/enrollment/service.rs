//! Submission orchestrator: turns an accepted draft into one (conditional)
//! student create, one enrollment create, and N concurrent payment creates,
//! compensating the enrollment when payments fail.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{info, warn};

use crate::records::{
    Enrollment, EnrollmentSelection, NewEnrollment, NewPayment, NewStudent, Payment, Student,
};

use super::draft::{EnrollmentDraft, EnrollmentKind};
use super::gateway::{EnrollmentGateway, GatewayError, PaymentGateway, StudentGateway};
use super::validate::{validate_step, ValidationErrors, WizardStep};

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub student: Student,
    pub student_created: bool,
    pub enrollment: Enrollment,
    pub payments: Vec<Payment>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("el borrador tiene campos inválidos")]
    Validation(ValidationErrors),
    #[error("el borrador está incompleto: falta {0}")]
    Incomplete(&'static str),
    #[error("{}", source.user_message())]
    Gateway {
        #[source]
        source: GatewayError,
    },
    /// A payment create failed after the enrollment was persisted; the
    /// enrollment and any payments that did land were deleted so a retry
    /// starts clean. Student creation stays, it is idempotent by DNI.
    #[error("no se pudo registrar los pagos: {}", source.user_message())]
    PaymentsFailed {
        #[source]
        source: GatewayError,
        compensated: bool,
    },
}

impl From<GatewayError> for EnrollmentError {
    fn from(source: GatewayError) -> Self {
        Self::Gateway { source }
    }
}

impl EnrollmentError {
    /// Status code for the HTTP error contract; validation maps to 400 and
    /// connectivity problems keep their normalized 0.
    pub fn status_code(&self) -> u16 {
        match self {
            EnrollmentError::Validation(_) | EnrollmentError::Incomplete(_) => 400,
            EnrollmentError::Gateway { source }
            | EnrollmentError::PaymentsFailed { source, .. } => source.status_code(),
        }
    }
}

pub struct EnrollmentService<S, E, P> {
    students: Arc<S>,
    enrollments: Arc<E>,
    payments: Arc<P>,
}

impl<S, E, P> EnrollmentService<S, E, P>
where
    S: StudentGateway + 'static,
    E: EnrollmentGateway + 'static,
    P: PaymentGateway + 'static,
{
    pub fn new(students: Arc<S>, enrollments: Arc<E>, payments: Arc<P>) -> Self {
        Self {
            students,
            enrollments,
            payments,
        }
    }

    /// Run the full submission sequence for a draft that reached review.
    pub async fn submit(
        &self,
        draft: &EnrollmentDraft,
        today: NaiveDate,
    ) -> Result<SubmissionReceipt, EnrollmentError> {
        let errors = validate_step(draft, WizardStep::Review, self.students.as_ref()).await?;
        if !errors.is_empty() {
            return Err(EnrollmentError::Validation(errors));
        }

        let (student, student_created) = self.resolve_student(draft).await?;

        let enrollment = self
            .enrollments
            .create(NewEnrollment {
                student: student.id,
                campus: draft.campus.ok_or(EnrollmentError::Incomplete("campus"))?,
                selection: selection_from_draft(draft)?,
                enrolled_on: today,
            })
            .await?;

        info!(
            enrollment = enrollment.id.0,
            student = student.id.0,
            "matrícula registrada"
        );

        let requests: Vec<NewPayment> = draft
            .payments
            .iter()
            .map(|payment| NewPayment {
                enrollment: enrollment.id,
                kind: payment.kind,
                metodo: payment.metodo,
                monto: payment.monto,
                meses_adelantados: payment.selected_months(),
                paid_on: today,
            })
            .collect();

        let outcomes = join_all(
            requests
                .into_iter()
                .map(|request| self.payments.create(request)),
        )
        .await;

        let mut created = Vec::with_capacity(outcomes.len());
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(payment) => created.push(payment),
                Err(err) if failure.is_none() => failure = Some(err),
                Err(_) => {}
            }
        }

        if let Some(source) = failure {
            let compensated = self.compensate(&enrollment, &created).await;
            return Err(EnrollmentError::PaymentsFailed {
                source,
                compensated,
            });
        }

        Ok(SubmissionReceipt {
            student,
            student_created,
            enrollment,
            payments: created,
        })
    }

    /// For a new student, look up by DNI first so a retried submit never
    /// duplicates the record; create only when absent.
    async fn resolve_student(
        &self,
        draft: &EnrollmentDraft,
    ) -> Result<(Student, bool), EnrollmentError> {
        if draft.is_existing_student {
            let id = draft
                .existing_student_id
                .ok_or(EnrollmentError::Incomplete("existing_student_id"))?;
            let student = self
                .students
                .fetch(id)
                .await?
                .ok_or_else(|| EnrollmentError::Gateway {
                    source: GatewayError::Backend {
                        status_code: 404,
                        message: "Alumno no encontrado".to_string(),
                    },
                })?;
            return Ok((student, false));
        }

        if let Some(student) = self.students.find_by_dni(draft.student.dni.trim()).await? {
            return Ok((student, false));
        }

        let identity = &draft.student;
        let student = self
            .students
            .create(NewStudent {
                nombres: identity.nombres.trim().to_string(),
                apellidos: identity.apellidos.trim().to_string(),
                dni: identity.dni.trim().to_string(),
                fecha_nacimiento: identity.fecha_nacimiento,
                telefono: identity.telefono.trim().to_string(),
                email: identity.email.trim().to_string(),
            })
            .await?;
        Ok((student, true))
    }

    /// Best-effort compensation: delete the payments that landed, then the
    /// enrollment. Returns whether every delete went through.
    async fn compensate(&self, enrollment: &Enrollment, created: &[Payment]) -> bool {
        let mut clean = true;

        for payment in created {
            if let Err(err) = self.payments.delete(payment.id).await {
                warn!(
                    payment = payment.id.0,
                    error = %err,
                    "no se pudo revertir el pago"
                );
                clean = false;
            }
        }

        if let Err(err) = self.enrollments.delete(enrollment.id).await {
            warn!(
                enrollment = enrollment.id.0,
                error = %err,
                "no se pudo revertir la matrícula"
            );
            clean = false;
        }

        clean
    }
}

fn selection_from_draft(draft: &EnrollmentDraft) -> Result<EnrollmentSelection, EnrollmentError> {
    match draft.kind {
        EnrollmentKind::Plan => Ok(EnrollmentSelection::Plan {
            plan: draft.plan.ok_or(EnrollmentError::Incomplete("plan"))?,
            course: draft.course.ok_or(EnrollmentError::Incomplete("course"))?,
            level: draft.level.ok_or(EnrollmentError::Incomplete("level"))?,
            cycle: draft.cycle.ok_or(EnrollmentError::Incomplete("cycle"))?,
            schedule: draft
                .schedule
                .clone()
                .ok_or(EnrollmentError::Incomplete("schedule"))?,
        }),
        EnrollmentKind::Product => Ok(EnrollmentSelection::Product {
            product: draft
                .product
                .ok_or(EnrollmentError::Incomplete("product"))?,
            exam_date: draft.exam_date,
            schedule: draft.schedule.clone(),
        }),
    }
}
