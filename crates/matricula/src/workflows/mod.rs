pub mod enrollment;
pub mod leads;
