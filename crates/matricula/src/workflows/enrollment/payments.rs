//! Payment and prepayment composition for the wizard's third step.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::PlanPrice;
use crate::records::{PaymentKind, PaymentMethod, PrepaidMonthRecord};

use super::draft::EnrollmentDraft;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// A calendar month inside a prepayment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    pub fn label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("mes");
        format!("{} {}", name, self.year)
    }
}

/// One row of a prepayment schedule; unselected months are kept so the user
/// can toggle them back without losing an amount override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidMonth {
    pub mes: MonthRef,
    pub monto: Decimal,
    pub selected: bool,
}

/// One row of the wizard's heterogeneous payment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub kind: PaymentKind,
    pub metodo: PaymentMethod,
    pub monto: Decimal,
    pub meses_adelantados: Vec<PrepaidMonth>,
}

impl PaymentDraft {
    pub fn new(kind: PaymentKind, monto: Decimal) -> Self {
        Self {
            kind,
            metodo: PaymentMethod::Efectivo,
            monto,
            meses_adelantados: Vec::new(),
        }
    }

    /// Sum of the selected months, written back into `monto`. Recomputation
    /// is idempotent: calling it twice changes nothing.
    pub fn recompute_prepaid_total(&mut self) {
        if self.meses_adelantados.is_empty() {
            return;
        }
        self.monto = self
            .meses_adelantados
            .iter()
            .filter(|month| month.selected)
            .map(|month| month.monto)
            .sum();
    }

    pub fn selected_months(&self) -> Vec<PrepaidMonthRecord> {
        self.meses_adelantados
            .iter()
            .filter(|month| month.selected)
            .map(|month| PrepaidMonthRecord {
                mes: month.mes.label(),
                monto: month.monto,
            })
            .collect()
    }
}

/// Two-decimal rendering used everywhere an amount is displayed.
pub fn format_monto(monto: Decimal) -> String {
    format!("{:.2}", monto)
}

/// Suggested payment set for a freshly selected plan: enrollment fee and
/// materials only apply to students not yet registered.
pub fn suggested_payments(price: &PlanPrice, is_existing_student: bool) -> Vec<PaymentDraft> {
    let mut payments = Vec::new();
    if !is_existing_student {
        payments.push(PaymentDraft::new(
            PaymentKind::Inscripcion,
            price.precio_inscripcion,
        ));
        payments.push(PaymentDraft::new(
            PaymentKind::Materiales,
            price.precio_materiales,
        ));
    }
    payments.push(PaymentDraft::new(
        PaymentKind::Mensualidad,
        price.precio_mensualidad,
    ));
    payments
}

/// Forward-looking month list for prepaid tuition: `duration_months`
/// consecutive months starting the month after `today`, each defaulted to
/// the plan's monthly price and initially selected.
pub fn prepayment_schedule(
    duration_months: u8,
    monthly_price: Decimal,
    today: NaiveDate,
) -> Vec<PrepaidMonth> {
    let mut year = today.year();
    let mut month = today.month();
    let mut schedule = Vec::with_capacity(duration_months as usize);
    for _ in 0..duration_months {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
        schedule.push(PrepaidMonth {
            mes: MonthRef { year, month },
            monto: monthly_price,
            selected: true,
        });
    }
    schedule
}

impl EnrollmentDraft {
    pub fn add_payment(&mut self, payment: PaymentDraft) {
        let kind = payment.kind;
        self.payments.push(payment);
        self.enforce_tuition_exclusivity(kind);
        self.errors.clear_field("pagos");
    }

    pub fn remove_payment(&mut self, index: usize) {
        if index < self.payments.len() {
            self.payments.remove(index);
        }
    }

    /// Changing a row's category re-applies the whole-draft exclusivity rule
    /// between current and prepaid tuition.
    pub fn set_payment_kind(&mut self, index: usize, kind: PaymentKind) {
        let Some(payment) = self.payments.get_mut(index) else {
            return;
        };
        payment.kind = kind;
        if kind != PaymentKind::MensualidadAdelantada {
            payment.meses_adelantados.clear();
        }
        self.enforce_tuition_exclusivity(kind);
        self.errors.clear_field("pagos");
    }

    /// Attach a prepayment schedule to a row, flipping it to prepaid tuition
    /// and recomputing its total.
    pub fn set_prepayment_schedule(&mut self, index: usize, schedule: Vec<PrepaidMonth>) {
        let Some(payment) = self.payments.get_mut(index) else {
            return;
        };
        payment.kind = PaymentKind::MensualidadAdelantada;
        payment.meses_adelantados = schedule;
        payment.recompute_prepaid_total();
        self.enforce_tuition_exclusivity(PaymentKind::MensualidadAdelantada);
        self.errors.clear_field("pagos");
    }

    pub fn toggle_prepaid_month(&mut self, index: usize, month_index: usize) {
        let Some(payment) = self.payments.get_mut(index) else {
            return;
        };
        if let Some(month) = payment.meses_adelantados.get_mut(month_index) {
            month.selected = !month.selected;
        }
        payment.recompute_prepaid_total();
    }

    pub fn set_prepaid_amount(&mut self, index: usize, month_index: usize, monto: Decimal) {
        let Some(payment) = self.payments.get_mut(index) else {
            return;
        };
        if let Some(month) = payment.meses_adelantados.get_mut(month_index) {
            month.monto = monto;
        }
        payment.recompute_prepaid_total();
    }

    /// `Mensualidad` and `Mensualidad Adelantada` never coexist: setting one
    /// drops rows of the other kind anywhere in the list.
    fn enforce_tuition_exclusivity(&mut self, chosen: PaymentKind) {
        let excluded = match chosen {
            PaymentKind::Mensualidad => PaymentKind::MensualidadAdelantada,
            PaymentKind::MensualidadAdelantada => PaymentKind::Mensualidad,
            _ => return,
        };
        self.payments.retain(|payment| payment.kind != excluded);
    }
}
