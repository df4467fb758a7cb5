use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampusId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u32);

/// A physical school location ("sede").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    pub id: CampusId,
    pub nombre: String,
    pub distrito: String,
    pub active: bool,
}

/// A recurring study plan sold per month over a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub nombre: String,
    pub duration_months: u8,
    pub active: bool,
}

/// Campus-specific pricing entry for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    pub plan: PlanId,
    pub campus: CampusId,
    pub precio_inscripcion: Decimal,
    pub precio_materiales: Decimal,
    pub precio_mensualidad: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub nombre: String,
}

/// A proficiency level inside a course (e.g. "Básico" within "Inglés").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub course: CourseId,
    pub nombre: String,
}

/// A cycle inside a level (e.g. "Básico 3").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    pub level: LevelId,
    pub nombre: String,
}

/// One-off offering (exam sitting, intensive workshop) sold outside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub nombre: String,
    pub precio: Decimal,
    pub requires_exam_date: bool,
    pub requires_schedule: bool,
    pub active: bool,
}

impl Product {
    pub fn requirements(&self) -> ProductRequirements {
        ProductRequirements {
            requires_exam_date: self.requires_exam_date,
            requires_schedule: self.requires_schedule,
        }
    }
}

/// The subset of product metadata the wizard needs after selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRequirements {
    pub requires_exam_date: bool,
    pub requires_schedule: bool,
}

/// Payload for registering a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub nombre: String,
    pub precio: Decimal,
    #[serde(default)]
    pub requires_exam_date: bool,
    #[serde(default)]
    pub requires_schedule: bool,
}
