pub mod plan;
pub mod session;
