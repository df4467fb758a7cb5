//! In-process wizard walkthrough: seeds the catalog, fills a draft step by
//! step, and submits it through the orchestrator, printing each stage.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;
use matricula::catalog::{CampusId, CatalogRepository, CourseId, CycleId, LevelId, PlanId};
use matricula::error::AppError;
use matricula::records::PaymentKind;
use matricula::workflows::enrollment::{
    format_monto, prepayment_schedule, EnrollmentDraft, EnrollmentError, EnrollmentService,
};
use matricula::workflows::enrollment::{GatewayError, StudentGateway};

use crate::infra::{
    compute_debts, InMemoryCatalog, InMemoryEnrollmentStore, InMemoryPaymentStore,
    InMemoryStudentStore,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the enrollment date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Prepay the first three months of tuition instead of a single month
    #[arg(long)]
    pub(crate) prepaid: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let catalog = InMemoryCatalog::seeded();
    let students = Arc::new(InMemoryStudentStore::default());
    let enrollments = Arc::new(InMemoryEnrollmentStore::default());
    let payments = Arc::new(InMemoryPaymentStore::default());
    let service = EnrollmentService::new(students.clone(), enrollments.clone(), payments.clone());

    println!("Matrícula wizard demo ({today})");

    let campus = CampusId(1);
    let plan = PlanId(2);
    let plan_record = catalog
        .plan(plan)
        .map_err(demo_error)?
        .ok_or_else(|| demo_error("seeded plan missing"))?;
    let price = catalog
        .price_for(campus, plan)
        .map_err(demo_error)?
        .ok_or_else(|| demo_error("seeded price missing"))?;

    let mut draft = EnrollmentDraft::new();
    draft.set_identity_field("nombres", "Lucía");
    draft.set_identity_field("apellidos", "Fernández");
    draft.set_identity_field("dni", "12345678");
    draft.set_identity_field("telefono", "987654321");
    draft.set_identity_field("email", "lucia@example.com");
    if let Some(birth) = NaiveDate::from_ymd_opt(2001, 4, 12) {
        draft.set_birth_date(birth);
    }
    advance(&mut draft, students.as_ref()).await?;

    draft.set_campus(campus);
    draft.set_plan(plan, plan_record.duration_months, &price);
    draft.set_course(CourseId(1));
    draft.set_level(LevelId(1));
    draft.set_cycle(CycleId(1));
    draft.set_schedule("L-M-V 18:00");
    advance(&mut draft, students.as_ref()).await?;

    println!("\nSuggested payments");
    for payment in &draft.payments {
        println!("- {}: {}", payment.kind.label(), format_monto(payment.monto));
    }

    if args.prepaid {
        let tuition = draft
            .payments
            .iter()
            .position(|payment| payment.kind == PaymentKind::Mensualidad)
            .ok_or_else(|| demo_error("suggested payments missing tuition"))?;
        let mut schedule = prepayment_schedule(3, price.precio_mensualidad, today);
        for month in &mut schedule {
            month.selected = true;
        }
        draft.set_prepayment_schedule(tuition, schedule);
        let prepaid = &draft.payments[tuition];
        println!("\nPrepaying tuition: {}", format_monto(prepaid.monto));
        for month in &prepaid.meses_adelantados {
            println!("  - {}: {}", month.mes.label(), format_monto(month.monto));
        }
    }
    advance(&mut draft, students.as_ref()).await?;

    let receipt = service
        .submit(&draft, today)
        .await
        .map_err(AppError::Enrollment)?;

    println!("\nEnrollment registered");
    println!(
        "- Student #{} {} {} (created: {})",
        receipt.student.id.0, receipt.student.nombres, receipt.student.apellidos,
        receipt.student_created
    );
    println!("- Enrollment #{}", receipt.enrollment.id.0);
    for payment in &receipt.payments {
        println!(
            "- Payment #{} {}: {} ({})",
            payment.id.0,
            payment.kind.label(),
            format_monto(payment.monto),
            payment.metodo.label()
        );
    }

    let debts = compute_debts(&catalog, &enrollments.list(), &payments.list()).map_err(demo_error)?;
    println!("\nOutstanding balances");
    for debt in &debts {
        println!(
            "- Enrollment #{}: expected {} | paid {} | balance {}{}",
            debt.enrollment.0,
            format_monto(debt.expected),
            format_monto(debt.paid),
            format_monto(debt.balance),
            if debt.settled() { " (settled)" } else { "" }
        );
    }

    Ok(())
}

async fn advance(
    draft: &mut EnrollmentDraft,
    students: &dyn StudentGateway,
) -> Result<(), AppError> {
    let step = draft.step;
    let moved = draft
        .try_advance(students)
        .await
        .map_err(|source| AppError::Enrollment(EnrollmentError::Gateway { source }))?;
    if moved {
        println!("Step {} ok", step.number());
        Ok(())
    } else {
        println!("Step {} blocked:", step.number());
        for field in draft.errors.fields() {
            if let Some(message) = draft.errors.get(field) {
                println!("  - {field}: {message}");
            }
        }
        Err(AppError::Enrollment(EnrollmentError::Validation(
            draft.errors.clone(),
        )))
    }
}

fn demo_error(message: impl ToString) -> AppError {
    AppError::Enrollment(EnrollmentError::Gateway {
        source: GatewayError::Connection(message.to_string()),
    })
}
