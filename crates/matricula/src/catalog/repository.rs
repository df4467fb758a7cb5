use super::domain::{
    Campus, CampusId, Course, CourseId, Cycle, Level, LevelId, NewProduct, Plan, PlanId, PlanPrice,
    Product, ProductId,
};

/// Storage abstraction over the reference data so the wizard and routes can
/// be exercised against in-memory fixtures.
pub trait CatalogRepository: Send + Sync {
    fn campuses(&self) -> Result<Vec<Campus>, CatalogError>;
    fn active_campuses(&self) -> Result<Vec<Campus>, CatalogError>;
    fn plans(&self) -> Result<Vec<Plan>, CatalogError>;
    fn active_plans(&self) -> Result<Vec<Plan>, CatalogError>;
    fn plan(&self, id: PlanId) -> Result<Option<Plan>, CatalogError>;
    fn prices_for_campus(&self, campus: CampusId) -> Result<Vec<PlanPrice>, CatalogError>;
    fn price_for(&self, campus: CampusId, plan: PlanId) -> Result<Option<PlanPrice>, CatalogError>;
    fn courses(&self) -> Result<Vec<Course>, CatalogError>;
    fn levels_for_course(&self, course: CourseId) -> Result<Vec<Level>, CatalogError>;
    fn cycles_for_level(&self, level: LevelId) -> Result<Vec<Cycle>, CatalogError>;
    fn products(&self) -> Result<Vec<Product>, CatalogError>;
    fn active_products(&self) -> Result<Vec<Product>, CatalogError>;
    fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;
    fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
