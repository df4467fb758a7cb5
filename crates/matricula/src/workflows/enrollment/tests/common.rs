use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::catalog::{CampusId, CourseId, CycleId, LevelId, Plan, PlanId, PlanPrice, Product, ProductId};
use crate::records::{
    Enrollment, EnrollmentId, NewEnrollment, NewPayment, NewStudent, Payment, PaymentId,
    PaymentKind, Student, StudentId,
};
use crate::workflows::enrollment::draft::EnrollmentDraft;
use crate::workflows::enrollment::gateway::{
    EnrollmentGateway, GatewayError, PaymentGateway, StudentGateway,
};

pub(super) fn price() -> PlanPrice {
    PlanPrice {
        plan: PlanId(2),
        campus: CampusId(1),
        precio_inscripcion: Decimal::from(150),
        precio_materiales: Decimal::from(80),
        precio_mensualidad: Decimal::from(329),
    }
}

pub(super) fn plan() -> Plan {
    Plan {
        id: PlanId(2),
        nombre: "Plan Intensivo".to_string(),
        duration_months: 6,
        active: true,
    }
}

pub(super) fn exam_product() -> Product {
    Product {
        id: ProductId(7),
        nombre: "Examen Internacional".to_string(),
        precio: Decimal::from(420),
        requires_exam_date: true,
        requires_schedule: false,
        active: true,
    }
}

pub(super) fn birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2001, 4, 12).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date")
}

/// Draft with every step filled in for a brand-new student.
pub(super) fn complete_draft() -> EnrollmentDraft {
    let mut draft = EnrollmentDraft::new();
    draft.set_identity_field("nombres", "Lucía");
    draft.set_identity_field("apellidos", "Fernández");
    draft.set_identity_field("dni", "12345678");
    draft.set_identity_field("telefono", "987654321");
    draft.set_identity_field("email", "lucia@example.com");
    draft.set_birth_date(birth_date());
    draft.set_campus(CampusId(1));
    draft.set_plan(PlanId(2), plan().duration_months, &price());
    draft.set_course(CourseId(1));
    draft.set_level(LevelId(3));
    draft.set_cycle(CycleId(9));
    draft.set_schedule("L-M-V 18:00");
    draft
}

pub(super) fn sample_student(id: u32, dni: &str) -> Student {
    Student {
        id: StudentId(id),
        nombres: "Marco".to_string(),
        apellidos: "Quispe".to_string(),
        dni: dni.to_string(),
        fecha_nacimiento: Some(birth_date()),
        telefono: "912345678".to_string(),
        email: "marco@example.com".to_string(),
    }
}

#[derive(Default)]
pub(super) struct MemoryStudents {
    records: Mutex<Vec<Student>>,
    sequence: AtomicU32,
}

impl MemoryStudents {
    pub(super) fn with_student(student: Student) -> Self {
        let store = Self::default();
        store.sequence.store(student.id.0, Ordering::Relaxed);
        store.records.lock().expect("lock").push(student);
        store
    }

    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("lock").len()
    }
}

#[async_trait]
impl StudentGateway for MemoryStudents {
    async fn find_by_dni(&self, dni: &str) -> Result<Option<Student>, GatewayError> {
        Ok(self
            .records
            .lock()
            .expect("lock")
            .iter()
            .find(|student| student.dni == dni)
            .cloned())
    }

    async fn fetch(&self, id: StudentId) -> Result<Option<Student>, GatewayError> {
        Ok(self
            .records
            .lock()
            .expect("lock")
            .iter()
            .find(|student| student.id == id)
            .cloned())
    }

    async fn create(&self, student: NewStudent) -> Result<Student, GatewayError> {
        let id = StudentId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Student {
            id,
            nombres: student.nombres,
            apellidos: student.apellidos,
            dni: student.dni,
            fecha_nacimiento: student.fecha_nacimiento,
            telefono: student.telefono,
            email: student.email,
        };
        self.records.lock().expect("lock").push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub(super) struct MemoryEnrollments {
    records: Mutex<Vec<Enrollment>>,
    pub(super) deleted: Mutex<Vec<EnrollmentId>>,
    sequence: AtomicU32,
}

impl MemoryEnrollments {
    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("lock").len()
    }
}

#[async_trait]
impl EnrollmentGateway for MemoryEnrollments {
    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, GatewayError> {
        let id = EnrollmentId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Enrollment {
            id,
            student: enrollment.student,
            campus: enrollment.campus,
            selection: enrollment.selection,
            enrolled_on: enrollment.enrolled_on,
        };
        self.records.lock().expect("lock").push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: EnrollmentId) -> Result<(), GatewayError> {
        self.records
            .lock()
            .expect("lock")
            .retain(|enrollment| enrollment.id != id);
        self.deleted.lock().expect("lock").push(id);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryPayments {
    records: Mutex<Vec<Payment>>,
    pub(super) deleted: Mutex<Vec<PaymentId>>,
    pub(super) fail_on: Mutex<Option<PaymentKind>>,
    sequence: AtomicU32,
}

impl MemoryPayments {
    pub(super) fn failing_on(kind: PaymentKind) -> Self {
        let store = Self::default();
        *store.fail_on.lock().expect("lock") = Some(kind);
        store
    }

    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("lock").len()
    }
}

#[async_trait]
impl PaymentGateway for MemoryPayments {
    async fn create(&self, payment: NewPayment) -> Result<Payment, GatewayError> {
        if *self.fail_on.lock().expect("lock") == Some(payment.kind) {
            return Err(GatewayError::Backend {
                status_code: 400,
                message: "Monto inválido para el tipo de pago".to_string(),
            });
        }
        let id = PaymentId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Payment {
            id,
            enrollment: payment.enrollment,
            kind: payment.kind,
            metodo: payment.metodo,
            monto: payment.monto,
            meses_adelantados: payment.meses_adelantados,
            paid_on: payment.paid_on,
        };
        self.records.lock().expect("lock").push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: PaymentId) -> Result<(), GatewayError> {
        self.records
            .lock()
            .expect("lock")
            .retain(|payment| payment.id != id);
        self.deleted.lock().expect("lock").push(id);
        Ok(())
    }
}
