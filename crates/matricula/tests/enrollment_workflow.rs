//! End-to-end walk of the enrollment wizard through the public facade:
//! cascade selections, step-by-step advancement, payment composition, and
//! final submission against in-memory gateways.

mod common {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use matricula::catalog::{CampusId, CourseId, CycleId, LevelId, PlanId, PlanPrice};
    use matricula::records::{
        Enrollment, EnrollmentId, NewEnrollment, NewPayment, NewStudent, Payment, PaymentId,
        Student, StudentId,
    };
    use matricula::workflows::enrollment::{
        EnrollmentDraft, EnrollmentGateway, GatewayError, PaymentGateway, StudentGateway,
    };

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date")
    }

    pub(super) fn price() -> PlanPrice {
        PlanPrice {
            plan: PlanId(2),
            campus: CampusId(1),
            precio_inscripcion: Decimal::from(150),
            precio_materiales: Decimal::from(80),
            precio_mensualidad: Decimal::from(329),
        }
    }

    pub(super) fn filled_draft() -> EnrollmentDraft {
        let mut draft = EnrollmentDraft::new();
        draft.set_identity_field("nombres", "Lucía");
        draft.set_identity_field("apellidos", "Fernández");
        draft.set_identity_field("dni", "12345678");
        draft.set_identity_field("telefono", "987654321");
        draft.set_identity_field("email", "lucia@example.com");
        draft.set_birth_date(NaiveDate::from_ymd_opt(2001, 4, 12).expect("valid date"));
        draft.set_campus(CampusId(1));
        draft.set_plan(PlanId(2), 6, &price());
        draft.set_course(CourseId(1));
        draft.set_level(LevelId(3));
        draft.set_cycle(CycleId(9));
        draft.set_schedule("L-M-V 18:00");
        draft
    }

    #[derive(Default)]
    pub(super) struct Students {
        records: Mutex<Vec<Student>>,
        sequence: AtomicU32,
    }

    #[async_trait]
    impl StudentGateway for Students {
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
    pub(super) struct Enrollments {
        records: Mutex<Vec<Enrollment>>,
        sequence: AtomicU32,
    }

    impl Enrollments {
        pub(super) fn count(&self) -> usize {
            self.records.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl EnrollmentGateway for Enrollments {
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
            Ok(())
        }
    }

    #[derive(Default)]
    pub(super) struct Payments {
        records: Mutex<Vec<Payment>>,
        sequence: AtomicU32,
    }

    impl Payments {
        pub(super) fn stored(&self) -> Vec<Payment> {
            self.records.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for Payments {
        async fn create(&self, payment: NewPayment) -> Result<Payment, GatewayError> {
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
            Ok(())
        }
    }
}

mod wizard {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use matricula::records::PaymentKind;
    use matricula::workflows::enrollment::{
        format_monto, prepayment_schedule, EnrollmentService, WizardStep,
    };

    use super::common::*;

    #[tokio::test]
    async fn a_new_student_walks_the_wizard_and_enrolls() {
        let students = Arc::new(Students::default());
        let enrollments = Arc::new(Enrollments::default());
        let payments = Arc::new(Payments::default());
        let service =
            EnrollmentService::new(students.clone(), enrollments.clone(), payments.clone());

        let mut draft = filled_draft();
        while draft.step != WizardStep::Review {
            assert!(
                draft.try_advance(students.as_ref()).await.expect("advance"),
                "step {:?} should validate",
                draft.step
            );
        }

        let receipt = service.submit(&draft, today()).await.expect("submission");

        assert!(receipt.student_created);
        assert_eq!(enrollments.count(), 1);
        assert_eq!(payments.stored().len(), 3);
    }

    #[tokio::test]
    async fn prepaid_tuition_flows_through_to_the_stored_payment() {
        let students = Arc::new(Students::default());
        let enrollments = Arc::new(Enrollments::default());
        let payments = Arc::new(Payments::default());
        let service =
            EnrollmentService::new(students.clone(), enrollments.clone(), payments.clone());

        let mut draft = filled_draft();
        let tuition = draft
            .payments
            .iter()
            .position(|payment| payment.kind == PaymentKind::Mensualidad)
            .expect("tuition row suggested");
        draft.set_prepayment_schedule(
            tuition,
            prepayment_schedule(3, Decimal::from(329), today()),
        );

        let receipt = service.submit(&draft, today()).await.expect("submission");

        let prepaid = receipt
            .payments
            .iter()
            .find(|payment| payment.kind == PaymentKind::MensualidadAdelantada)
            .expect("prepaid payment stored");
        assert_eq!(format_monto(prepaid.monto), "987.00");
        assert_eq!(prepaid.meses_adelantados.len(), 3);
        assert_eq!(prepaid.meses_adelantados[0].mes, "septiembre 2026");
    }
}
