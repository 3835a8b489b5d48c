//! RRP Core: request model, logs-as-values, request id derivation,
//! reserved parameters and response encoding.

pub mod config;
pub mod logging;
pub mod request_id;
pub mod reserved;
pub mod response;
pub mod types;

pub use config::{ChainConfig, Config, ConfigError, Endpoint, Ois};
pub use logging::{merge_logs, LogAccumulator, LogEntry, LogLevel, LogsAndValue};
pub use request_id::derive_request_id;
pub use response::{EncodeError, ResponseType};
pub use types::{
    ApiCallResult, AuthorizationByRequestId, ErrorKind, Request, RequestId, RequestKind,
    RequestMetadata, RequestStatus, TemplateEndpoint,
};
