//! The multi-step enrollment wizard: draft state, cascading selectors,
//! per-step validation, payment/prepayment composition, and the submission
//! orchestrator that turns an accepted draft into backend records.

pub mod draft;
pub mod gateway;
pub mod payments;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests;

pub use draft::{CascadeEffect, EnrollmentDraft, EnrollmentKind, StudentIdentity};
pub use gateway::{EnrollmentGateway, GatewayError, PaymentGateway, StudentGateway};
pub use payments::{
    format_monto, prepayment_schedule, suggested_payments, MonthRef, PaymentDraft, PrepaidMonth,
};
pub use service::{EnrollmentError, EnrollmentService, SubmissionReceipt};
pub use validate::{validate_step, ValidationErrors, WizardStep};
