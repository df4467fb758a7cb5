//! In-memory infrastructure behind the domain traits, plus the seeded
//! catalog the admin area works against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use matricula::auth::{AuthError, Session, SessionStore, SessionToken};
use matricula::catalog::{
    Campus, CampusId, CatalogError, CatalogRepository, Course, CourseId, Cycle, CycleId, Level,
    LevelId, NewProduct, Plan, PlanId, PlanPrice, Product, ProductId,
};
use matricula::records::{
    Debt, Enrollment, EnrollmentId, EnrollmentSelection, NewEnrollment, NewPayment, NewStudent,
    Payment, PaymentId, PaymentKind, Student, StudentId,
};
use matricula::workflows::enrollment::{
    EnrollmentGateway, GatewayError, PaymentGateway, StudentGateway,
};
use matricula::workflows::leads::{Lead, LeadError, LeadId, LeadRepository, LeadStatus};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct CatalogData {
    campuses: Vec<Campus>,
    plans: Vec<Plan>,
    prices: Vec<PlanPrice>,
    courses: Vec<Course>,
    levels: Vec<Level>,
    cycles: Vec<Cycle>,
    products: Vec<Product>,
}

#[derive(Default)]
pub(crate) struct InMemoryCatalog {
    data: Mutex<CatalogData>,
    product_sequence: AtomicU32,
}

impl InMemoryCatalog {
    /// Catalog used by the development server and the handler tests.
    pub(crate) fn seeded() -> Self {
        let catalog = Self::default();
        {
            let mut data = catalog.data.lock().expect("catalog mutex poisoned");
            data.campuses = vec![
                Campus {
                    id: CampusId(1),
                    nombre: "Sede Miraflores".to_string(),
                    distrito: "Miraflores".to_string(),
                    active: true,
                },
                Campus {
                    id: CampusId(2),
                    nombre: "Sede San Miguel".to_string(),
                    distrito: "San Miguel".to_string(),
                    active: true,
                },
                Campus {
                    id: CampusId(3),
                    nombre: "Sede Centro (cerrada)".to_string(),
                    distrito: "Cercado".to_string(),
                    active: false,
                },
            ];
            data.plans = vec![
                Plan {
                    id: PlanId(1),
                    nombre: "Plan Regular".to_string(),
                    duration_months: 12,
                    active: true,
                },
                Plan {
                    id: PlanId(2),
                    nombre: "Plan Intensivo".to_string(),
                    duration_months: 6,
                    active: true,
                },
            ];
            data.prices = vec![
                PlanPrice {
                    plan: PlanId(1),
                    campus: CampusId(1),
                    precio_inscripcion: Decimal::from(100),
                    precio_materiales: Decimal::from(60),
                    precio_mensualidad: Decimal::from(249),
                },
                PlanPrice {
                    plan: PlanId(2),
                    campus: CampusId(1),
                    precio_inscripcion: Decimal::from(150),
                    precio_materiales: Decimal::from(80),
                    precio_mensualidad: Decimal::from(329),
                },
                PlanPrice {
                    plan: PlanId(2),
                    campus: CampusId(2),
                    precio_inscripcion: Decimal::from(140),
                    precio_materiales: Decimal::from(80),
                    precio_mensualidad: Decimal::from(309),
                },
            ];
            data.courses = vec![
                Course {
                    id: CourseId(1),
                    nombre: "Inglés".to_string(),
                },
                Course {
                    id: CourseId(2),
                    nombre: "Portugués".to_string(),
                },
            ];
            data.levels = vec![
                Level {
                    id: LevelId(1),
                    course: CourseId(1),
                    nombre: "Básico".to_string(),
                },
                Level {
                    id: LevelId(2),
                    course: CourseId(1),
                    nombre: "Intermedio".to_string(),
                },
                Level {
                    id: LevelId(3),
                    course: CourseId(2),
                    nombre: "Básico".to_string(),
                },
            ];
            data.cycles = vec![
                Cycle {
                    id: CycleId(1),
                    level: LevelId(1),
                    nombre: "Básico 1".to_string(),
                },
                Cycle {
                    id: CycleId(2),
                    level: LevelId(1),
                    nombre: "Básico 2".to_string(),
                },
                Cycle {
                    id: CycleId(3),
                    level: LevelId(2),
                    nombre: "Intermedio 1".to_string(),
                },
            ];
            data.products = vec![Product {
                id: ProductId(1),
                nombre: "Examen Internacional".to_string(),
                precio: Decimal::from(420),
                requires_exam_date: true,
                requires_schedule: false,
                active: true,
            }];
        }
        catalog.product_sequence.store(1, Ordering::Relaxed);
        catalog
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn campuses(&self) -> Result<Vec<Campus>, CatalogError> {
        Ok(self.data.lock().expect("catalog mutex poisoned").campuses.clone())
    }

    fn active_campuses(&self) -> Result<Vec<Campus>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .campuses
            .iter()
            .filter(|campus| campus.active)
            .cloned()
            .collect())
    }

    fn plans(&self) -> Result<Vec<Plan>, CatalogError> {
        Ok(self.data.lock().expect("catalog mutex poisoned").plans.clone())
    }

    fn active_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .plans
            .iter()
            .filter(|plan| plan.active)
            .cloned()
            .collect())
    }

    fn plan(&self, id: PlanId) -> Result<Option<Plan>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .plans
            .iter()
            .find(|plan| plan.id == id)
            .cloned())
    }

    fn prices_for_campus(&self, campus: CampusId) -> Result<Vec<PlanPrice>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .prices
            .iter()
            .filter(|price| price.campus == campus)
            .cloned()
            .collect())
    }

    fn price_for(&self, campus: CampusId, plan: PlanId) -> Result<Option<PlanPrice>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .prices
            .iter()
            .find(|price| price.campus == campus && price.plan == plan)
            .cloned())
    }

    fn courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.data.lock().expect("catalog mutex poisoned").courses.clone())
    }

    fn levels_for_course(&self, course: CourseId) -> Result<Vec<Level>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .levels
            .iter()
            .filter(|level| level.course == course)
            .cloned()
            .collect())
    }

    fn cycles_for_level(&self, level: LevelId) -> Result<Vec<Cycle>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .cycles
            .iter()
            .filter(|cycle| cycle.level == level)
            .cloned()
            .collect())
    }

    fn products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.data.lock().expect("catalog mutex poisoned").products.clone())
    }

    fn active_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .products
            .iter()
            .filter(|product| product.active)
            .cloned()
            .collect())
    }

    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self
            .data
            .lock()
            .expect("catalog mutex poisoned")
            .products
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let id = ProductId(self.product_sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Product {
            id,
            nombre: product.nombre,
            precio: product.precio,
            requires_exam_date: product.requires_exam_date,
            requires_schedule: product.requires_schedule,
            active: true,
        };
        self.data
            .lock()
            .expect("catalog mutex poisoned")
            .products
            .push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStudentStore {
    records: Mutex<Vec<Student>>,
    sequence: AtomicU32,
}

impl InMemoryStudentStore {
    pub(crate) fn list(&self) -> Vec<Student> {
        self.records.lock().expect("student mutex poisoned").clone()
    }

    pub(crate) fn get(&self, id: StudentId) -> Option<Student> {
        self.records
            .lock()
            .expect("student mutex poisoned")
            .iter()
            .find(|student| student.id == id)
            .cloned()
    }
}

#[async_trait]
impl StudentGateway for InMemoryStudentStore {
    async fn find_by_dni(&self, dni: &str) -> Result<Option<Student>, GatewayError> {
        Ok(self
            .records
            .lock()
            .expect("student mutex poisoned")
            .iter()
            .find(|student| student.dni == dni)
            .cloned())
    }

    async fn fetch(&self, id: StudentId) -> Result<Option<Student>, GatewayError> {
        Ok(self.get(id))
    }

    async fn create(&self, student: NewStudent) -> Result<Student, GatewayError> {
        let mut guard = self.records.lock().expect("student mutex poisoned");
        if guard.iter().any(|existing| existing.dni == student.dni) {
            return Err(GatewayError::Backend {
                status_code: 400,
                message: "Ya existe un alumno con este DNI".to_string(),
            });
        }
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
        guard.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryEnrollmentStore {
    records: Mutex<Vec<Enrollment>>,
    sequence: AtomicU32,
}

impl InMemoryEnrollmentStore {
    pub(crate) fn list(&self) -> Vec<Enrollment> {
        self.records.lock().expect("enrollment mutex poisoned").clone()
    }
}

#[async_trait]
impl EnrollmentGateway for InMemoryEnrollmentStore {
    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, GatewayError> {
        let id = EnrollmentId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Enrollment {
            id,
            student: enrollment.student,
            campus: enrollment.campus,
            selection: enrollment.selection,
            enrolled_on: enrollment.enrolled_on,
        };
        self.records
            .lock()
            .expect("enrollment mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: EnrollmentId) -> Result<(), GatewayError> {
        self.records
            .lock()
            .expect("enrollment mutex poisoned")
            .retain(|enrollment| enrollment.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryPaymentStore {
    records: Mutex<Vec<Payment>>,
    sequence: AtomicU32,
}

impl InMemoryPaymentStore {
    pub(crate) fn list(&self) -> Vec<Payment> {
        self.records.lock().expect("payment mutex poisoned").clone()
    }

    pub(crate) fn get(&self, id: PaymentId) -> Option<Payment> {
        self.records
            .lock()
            .expect("payment mutex poisoned")
            .iter()
            .find(|payment| payment.id == id)
            .cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentStore {
    async fn create(&self, payment: NewPayment) -> Result<Payment, GatewayError> {
        if payment.monto <= Decimal::ZERO {
            return Err(GatewayError::Backend {
                status_code: 400,
                message: "El monto debe ser mayor a cero".to_string(),
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
        self.records
            .lock()
            .expect("payment mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: PaymentId) -> Result<(), GatewayError> {
        self.records
            .lock()
            .expect("payment mutex poisoned")
            .retain(|payment| payment.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryLeadStore {
    records: Mutex<HashMap<LeadId, Lead>>,
    sequence: AtomicU32,
}

impl LeadRepository for InMemoryLeadStore {
    fn insert(&self, lead: Lead) -> Result<Lead, LeadError> {
        self.records
            .lock()
            .expect("lead mutex poisoned")
            .insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn list(&self) -> Result<Vec<Lead>, LeadError> {
        Ok(self
            .records
            .lock()
            .expect("lead mutex poisoned")
            .values()
            .cloned()
            .collect())
    }

    fn update_status(&self, id: LeadId, status: LeadStatus) -> Result<Lead, LeadError> {
        let mut guard = self.records.lock().expect("lead mutex poisoned");
        let lead = guard.get_mut(&id).ok_or(LeadError::NotFound)?;
        lead.status = status;
        Ok(lead.clone())
    }

    fn remove_where(&self, predicate: &dyn Fn(&Lead) -> bool) -> Result<usize, LeadError> {
        let mut guard = self.records.lock().expect("lead mutex poisoned");
        let before = guard.len();
        guard.retain(|_, lead| !predicate(lead));
        Ok(before - guard.len())
    }

    fn next_id(&self) -> LeadId {
        LeadId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Default)]
pub(crate) struct InMemorySessionStore {
    records: Mutex<HashMap<SessionToken, Session>>,
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) -> Result<(), AuthError> {
        self.records
            .lock()
            .expect("session mutex poisoned")
            .insert(session.token.clone(), session);
        Ok(())
    }

    fn fetch(&self, token: &SessionToken) -> Result<Option<Session>, AuthError> {
        Ok(self
            .records
            .lock()
            .expect("session mutex poisoned")
            .get(token)
            .cloned())
    }

    fn revoke(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.records
            .lock()
            .expect("session mutex poisoned")
            .remove(token);
        Ok(())
    }
}

/// Outstanding balances per enrollment: plan enrollments expect duration ×
/// monthly price, with tuition payments (current and prepaid) counting
/// against that total; product enrollments expect the product price, with
/// every payment recorded against them counting.
pub(crate) fn compute_debts(
    catalog: &dyn CatalogRepository,
    enrollments: &[Enrollment],
    payments: &[Payment],
) -> Result<Vec<Debt>, CatalogError> {
    let mut debts = Vec::with_capacity(enrollments.len());

    for enrollment in enrollments {
        let expected = match &enrollment.selection {
            EnrollmentSelection::Plan { plan, .. } => {
                let duration = catalog
                    .plan(*plan)?
                    .map(|plan| plan.duration_months)
                    .unwrap_or(0);
                let monthly = catalog
                    .price_for(enrollment.campus, *plan)?
                    .map(|price| price.precio_mensualidad)
                    .unwrap_or(Decimal::ZERO);
                monthly * Decimal::from(duration)
            }
            EnrollmentSelection::Product { product, .. } => catalog
                .product(*product)?
                .map(|product| product.precio)
                .unwrap_or(Decimal::ZERO),
        };

        let paid: Decimal = payments
            .iter()
            .filter(|payment| payment.enrollment == enrollment.id)
            .filter(|payment| match &enrollment.selection {
                EnrollmentSelection::Plan { .. } => matches!(
                    payment.kind,
                    PaymentKind::Mensualidad | PaymentKind::MensualidadAdelantada
                ),
                EnrollmentSelection::Product { .. } => true,
            })
            .map(|payment| payment.monto)
            .sum();

        debts.push(Debt {
            enrollment: enrollment.id,
            student: enrollment.student,
            expected,
            paid,
            balance: expected - paid,
        });
    }

    Ok(debts)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
