use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::{
    CampusId, CourseId, CycleId, LevelId, PlanId, PlanPrice, Product, ProductId,
    ProductRequirements,
};
use crate::records::StudentId;

use super::payments::{suggested_payments, PaymentDraft};
use super::validate::{ValidationErrors, WizardStep};

/// Identity fields collected on step 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub nombres: String,
    pub apellidos: String,
    pub dni: String,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub telefono: String,
    pub email: String,
}

impl From<crate::records::Student> for StudentIdentity {
    fn from(student: crate::records::Student) -> Self {
        Self {
            nombres: student.nombres,
            apellidos: student.apellidos,
            dni: student.dni,
            fecha_nacimiento: student.fecha_nacimiento,
            telefono: student.telefono,
            email: student.email,
        }
    }
}

/// Whether the draft enrolls into a recurring plan or a one-off product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentKind {
    Plan,
    Product,
}

/// Dependent refetch a caller must run after a cascading selection. Keeping
/// the fetch out of the setter makes each transition a pure, testable step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeEffect {
    None,
    FetchPriceList { campus: CampusId },
    FetchLevels { course: CourseId },
    FetchCycles { level: LevelId },
}

/// In-progress wizard state. Created empty when the wizard opens, mutated by
/// user input and cascade effects, discarded after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentDraft {
    pub student: StudentIdentity,
    pub is_existing_student: bool,
    pub existing_student_id: Option<StudentId>,
    pub kind: EnrollmentKind,
    pub campus: Option<CampusId>,
    pub plan: Option<PlanId>,
    pub plan_duration_months: Option<u8>,
    pub course: Option<CourseId>,
    pub level: Option<LevelId>,
    pub cycle: Option<CycleId>,
    pub product: Option<ProductId>,
    pub product_requirements: Option<ProductRequirements>,
    pub exam_date: Option<NaiveDate>,
    pub schedule: Option<String>,
    pub payments: Vec<PaymentDraft>,
    pub step: WizardStep,
    pub errors: ValidationErrors,
}

impl Default for EnrollmentDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrollmentDraft {
    pub fn new() -> Self {
        Self {
            student: StudentIdentity::default(),
            is_existing_student: false,
            existing_student_id: None,
            kind: EnrollmentKind::Plan,
            campus: None,
            plan: None,
            plan_duration_months: None,
            course: None,
            level: None,
            cycle: None,
            product: None,
            product_requirements: None,
            exam_date: None,
            schedule: None,
            payments: Vec::new(),
            step: WizardStep::Student,
            errors: ValidationErrors::default(),
        }
    }

    /// Reopen the wizard for an already-registered student.
    pub fn for_existing_student(id: StudentId, identity: StudentIdentity) -> Self {
        Self {
            student: identity,
            is_existing_student: true,
            existing_student_id: Some(id),
            ..Self::new()
        }
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let born = self.student.fecha_nacimiento?;
        if born > today {
            return None;
        }
        let mut age = (today.year() - born.year()) as u32;
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age = age.saturating_sub(1);
        }
        Some(age)
    }

    /// Selecting a campus invalidates any plan pricing derived from the
    /// previous campus; the caller must refetch the price list.
    pub fn set_campus(&mut self, campus: CampusId) -> CascadeEffect {
        self.campus = Some(campus);
        self.plan = None;
        self.plan_duration_months = None;
        self.errors.clear_field("campus");
        CascadeEffect::FetchPriceList { campus }
    }

    /// Selecting a plan (with its matched price-list entry already loaded)
    /// replaces the whole payment list with the suggested set.
    pub fn set_plan(&mut self, plan: PlanId, duration_months: u8, price: &PlanPrice) -> CascadeEffect {
        self.plan = Some(plan);
        self.plan_duration_months = Some(duration_months);
        self.payments = suggested_payments(price, self.is_existing_student);
        self.errors.clear_field("plan");
        CascadeEffect::None
    }

    pub fn set_course(&mut self, course: CourseId) -> CascadeEffect {
        self.course = Some(course);
        self.level = None;
        self.cycle = None;
        self.errors.clear_field("course");
        CascadeEffect::FetchLevels { course }
    }

    pub fn set_level(&mut self, level: LevelId) -> CascadeEffect {
        self.level = Some(level);
        self.cycle = None;
        self.errors.clear_field("level");
        CascadeEffect::FetchCycles { level }
    }

    pub fn set_cycle(&mut self, cycle: CycleId) -> CascadeEffect {
        self.cycle = Some(cycle);
        self.errors.clear_field("cycle");
        CascadeEffect::None
    }

    pub fn set_kind(&mut self, kind: EnrollmentKind) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        match kind {
            EnrollmentKind::Plan => {
                self.product = None;
                self.product_requirements = None;
                self.exam_date = None;
            }
            EnrollmentKind::Product => {
                self.plan = None;
                self.plan_duration_months = None;
                self.course = None;
                self.level = None;
                self.cycle = None;
            }
        }
    }

    pub fn set_product(&mut self, product: &Product) -> CascadeEffect {
        self.product = Some(product.id);
        self.product_requirements = Some(product.requirements());
        if !product.requires_exam_date {
            self.exam_date = None;
        }
        self.errors.clear_field("product");
        CascadeEffect::None
    }

    pub fn set_exam_date(&mut self, date: NaiveDate) {
        self.exam_date = Some(date);
        self.errors.clear_field("exam_date");
    }

    pub fn set_schedule(&mut self, schedule: impl Into<String>) {
        self.schedule = Some(schedule.into());
        self.errors.clear_field("schedule");
    }

    /// Identity edits clear the matching field error optimistically; the
    /// field is only re-validated on the next step transition.
    pub fn set_identity_field(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match field {
            "nombres" => self.student.nombres = value,
            "apellidos" => self.student.apellidos = value,
            "dni" => self.student.dni = value,
            "telefono" => self.student.telefono = value,
            "email" => self.student.email = value,
            _ => return,
        }
        self.errors.clear_field(field);
    }

    pub fn set_birth_date(&mut self, date: NaiveDate) {
        self.student.fecha_nacimiento = Some(date);
        self.errors.clear_field("fecha_nacimiento");
    }
}
