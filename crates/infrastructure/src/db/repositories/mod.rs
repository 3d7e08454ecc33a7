pub mod service_request_repository_impl;
pub mod user_repository_impl;

pub use service_request_repository_impl::PgServiceRequestRepository;
pub use user_repository_impl::PgUserRepository;
