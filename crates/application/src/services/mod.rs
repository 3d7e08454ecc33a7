pub mod matching_service;


pub use matching_service::{MatchingService, MatchingServiceDependencies};
