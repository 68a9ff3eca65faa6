// Resume upload: stores the file and registers a placeholder analysis
// document that a later analyzer fills in.

pub mod handlers;
pub mod store;
pub mod upload;
