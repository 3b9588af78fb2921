#![forbid(unsafe_code)]

pub mod gateway;
pub mod http;
pub mod memory;

pub use gateway::{AssessmentGateway, GatewayError};
pub use http::{HttpGateway, HttpGatewayConfig, RetryPolicy};
pub use memory::{InMemoryGateway, RecordedSubmission};
