pub mod assessment;
pub mod resume;
