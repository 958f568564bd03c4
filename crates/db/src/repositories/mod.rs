pub mod analysis_repo;
pub mod image_repo;

pub use analysis_repo::AnalysisRepo;
pub use image_repo::GeneratedImageRepo;
