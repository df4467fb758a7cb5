//! Reference data backing the enrollment wizard: campuses, plans and their
//! per-campus price lists, course/level/cycle hierarchies, and one-off
//! products.

pub mod domain;
pub mod repository;

pub use domain::{
    Campus, CampusId, Course, CourseId, Cycle, CycleId, Level, LevelId, NewProduct, Plan, PlanId,
    PlanPrice, Product, ProductId, ProductRequirements,
};
pub use repository::{CatalogError, CatalogRepository};
