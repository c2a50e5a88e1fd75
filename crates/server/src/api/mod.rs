pub mod convert;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod upload;
pub mod ws;

pub use routes::create_router;
