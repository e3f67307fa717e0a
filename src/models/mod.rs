pub mod quiz;
pub mod validation;
