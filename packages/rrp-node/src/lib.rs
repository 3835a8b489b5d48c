//! RRP Node: verification, authorization and API call stages of an RRP
//! oracle node, plus the orchestrator that runs them over a request batch.

pub mod adapter;
pub mod api_call;
pub mod authorization;
pub mod chain;
pub mod pipeline;
pub mod retry;
pub mod settings;
pub mod telemetry;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapter::{ApiCallRequest, ApiCaller, ApiCredential, HttpApiCaller};
pub use api_call::{call_api, ApiCallOptions};
pub use authorization::FetchOptions;
pub use chain::{AuthorizationQuery, AuthorizationReader, AuthorizationTarget};
pub use pipeline::{process_requests, PipelineContext, ProcessedRequest, RequestOutcome};
pub use retry::{RetryError, RetryOptions};
pub use settings::ProcessingSettings;
pub use verification::{verify_chain_ids, verify_request_ids};
