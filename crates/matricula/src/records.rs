//! Backend-owned entities: students, enrollments, payments, and the debt
//! view derived from them. The wizard only ever holds transient copies of
//! these; persistence lives behind the gateway traits in
//! `workflows::enrollment::gateway`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CampusId, CourseId, CycleId, LevelId, PlanId, ProductId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub nombres: String,
    pub apellidos: String,
    pub dni: String,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub telefono: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub nombres: String,
    pub apellidos: String,
    pub dni: String,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub telefono: String,
    pub email: String,
}

/// What the enrollment actually registers the student into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum EnrollmentSelection {
    Plan {
        plan: PlanId,
        course: CourseId,
        level: LevelId,
        cycle: CycleId,
        schedule: String,
    },
    Product {
        product: ProductId,
        exam_date: Option<NaiveDate>,
        schedule: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student: StudentId,
    pub campus: CampusId,
    pub selection: EnrollmentSelection,
    pub enrolled_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub campus: CampusId,
    pub selection: EnrollmentSelection,
    pub enrolled_on: NaiveDate,
}

/// Payment categories. `Mensualidad` and `MensualidadAdelantada` are
/// mutually exclusive across a draft's payment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Inscripcion,
    Materiales,
    Mensualidad,
    MensualidadAdelantada,
    Examen,
}

impl PaymentKind {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentKind::Inscripcion => "Inscripción",
            PaymentKind::Materiales => "Materiales",
            PaymentKind::Mensualidad => "Mensualidad",
            PaymentKind::MensualidadAdelantada => "Mensualidad Adelantada",
            PaymentKind::Examen => "Examen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
    Yape,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "Efectivo",
            PaymentMethod::Tarjeta => "Tarjeta",
            PaymentMethod::Transferencia => "Transferencia",
            PaymentMethod::Yape => "Yape",
        }
    }
}

/// Stored breakdown of a prepaid-tuition payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidMonthRecord {
    pub mes: String,
    pub monto: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub enrollment: EnrollmentId,
    pub kind: PaymentKind,
    pub metodo: PaymentMethod,
    pub monto: Decimal,
    pub meses_adelantados: Vec<PrepaidMonthRecord>,
    pub paid_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub enrollment: EnrollmentId,
    pub kind: PaymentKind,
    pub metodo: PaymentMethod,
    pub monto: Decimal,
    pub meses_adelantados: Vec<PrepaidMonthRecord>,
    pub paid_on: NaiveDate,
}

/// Outstanding balance owed against an enrollment: expected plan total minus
/// tuition received so far. Product enrollments expect the product price
/// minus whatever was paid against them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub enrollment: EnrollmentId,
    pub student: StudentId,
    pub expected: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
}

impl Debt {
    pub fn settled(&self) -> bool {
        self.balance <= Decimal::ZERO
    }
}
