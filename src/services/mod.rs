pub mod generator_service;
pub mod llm_service;
pub mod quiz_service;
pub mod search_service;
pub mod verification_service;
