//! Pipeline orchestration.
//!
//! Runs verification, authorization and API dispatch over one batch of
//! requests and threads every stage's logs into one ordered list: stage
//! first, then request order within a stage.

use alloy_primitives::Bytes;
use futures_util::future::join_all;
use rrp_core::config::ChainConfig;
use rrp_core::{
    ApiCallResult, AuthorizationByRequestId, Config, ErrorKind, LogAccumulator, LogEntry,
    LogsAndValue, Request, RequestStatus,
};
use tracing::{info_span, Instrument};

use crate::adapter::ApiCaller;
use crate::api_call::{call_api, ApiCallOptions};
use crate::authorization::{fetch, FetchOptions};
use crate::chain::AuthorizationReader;
use crate::settings::ProcessingSettings;
use crate::verification::{verify_chain_ids, verify_request_ids};

/// Everything one pipeline run reads from. Shared, never mutated.
#[derive(Clone, Copy)]
pub struct PipelineContext<'a> {
    pub config: &'a Config,
    /// Chain every request of the run was made on.
    pub chain: &'a ChainConfig,
    pub reader: &'a dyn AuthorizationReader,
    pub caller: &'a dyn ApiCaller,
    pub settings: &'a ProcessingSettings,
}

/// What happened to one request during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// API value ready for the fulfillment transaction.
    Fulfilled { value: Bytes },
    Errored { kind: ErrorKind, message: String },
    Unauthorized,
    /// Authorization could not be read; the request stays pending for a
    /// later run.
    AuthorizationUnknown,
    /// Not pending (on arrival or after verification); never dispatched.
    Skipped { status: RequestStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRequest {
    pub request: Request,
    pub outcome: RequestOutcome,
}

/// Processes one batch of requests. The output has one entry per input
/// request, in input order.
pub async fn process_requests(
    requests: &[Request],
    context: &PipelineContext<'_>,
) -> LogsAndValue<Vec<ProcessedRequest>> {
    let mut logs = LogAccumulator::new();

    let verified = info_span!("verify_request_ids", requests = requests.len())
        .in_scope(|| verify_request_ids(requests));
    let verified = logs.absorb(verified);
    let verified = info_span!("verify_chain_ids", chain_id = %context.chain.id)
        .in_scope(|| verify_chain_ids(verified, context.chain));
    let verified = logs.absorb(verified);

    let fetch_options = FetchOptions {
        authorizers: &context.chain.authorizers,
        airnode_address: context.config.node_settings.airnode_address,
        airnode_rrp_address: context.chain.contracts.airnode_rrp,
        reader: context.reader,
        batch_size: context.settings.authorization_batch_size,
        retry: context.settings.chain_retry_options(),
    };
    let authorizations = fetch(&verified, &fetch_options)
        .instrument(info_span!("fetch_authorizations", chain_id = %context.chain.id))
        .await;
    let authorizations = logs.absorb(authorizations);
    tracing::debug!(
        pending = verified.iter().filter(|r| r.is_pending()).count(),
        authorized = authorizations.values().filter(|a| **a).count(),
        resolved = authorizations.len(),
        "authorization stage complete"
    );

    let api_options = ApiCallOptions {
        chain: context.chain,
        caller: context.caller,
        timeout: context.settings.api_call_timeout,
    };
    let api_results = join_all(verified.iter().map(|request| {
        let dispatch = is_authorized(request, &authorizations);
        let config = context.config;
        let api_options = &api_options;
        async move {
            if !dispatch {
                return None;
            }
            let span = info_span!("call_api", request_id = %request.id);
            Some(call_api(config, request, api_options).instrument(span).await)
        }
    }))
    .await;
    tracing::debug!(
        dispatched = api_results.iter().filter(|r| r.is_some()).count(),
        "api call stage complete"
    );

    let processed: Vec<_> = verified
        .into_iter()
        .zip(api_results)
        .map(|(request, api_result)| {
            let (request_logs, processed) = settle(request, &authorizations, api_result);
            logs.extend(request_logs);
            processed
        })
        .collect();
    logs.finish(processed)
}

fn is_authorized(request: &Request, authorizations: &AuthorizationByRequestId) -> bool {
    request.is_pending() && authorizations.get(&request.id).copied().unwrap_or(false)
}

/// Final outcome of one request given its authorization and API result.
fn settle(
    request: Request,
    authorizations: &AuthorizationByRequestId,
    api_result: Option<LogsAndValue<ApiCallResult>>,
) -> (Vec<LogEntry>, ProcessedRequest) {
    if !request.is_pending() {
        let outcome = RequestOutcome::Skipped {
            status: request.status,
        };
        return (Vec::new(), ProcessedRequest { request, outcome });
    }

    let Some(api_result) = api_result else {
        let (log, outcome) = match authorizations.get(&request.id) {
            Some(_) => (
                LogEntry::info(format!("Request ID:{} is not authorized", request.id)),
                RequestOutcome::Unauthorized,
            ),
            None => (
                LogEntry::info(format!(
                    "Authorization status of Request ID:{} is unknown. Leaving it pending",
                    request.id
                )),
                RequestOutcome::AuthorizationUnknown,
            ),
        };
        return (vec![log], ProcessedRequest { request, outcome });
    };

    let (logs, result) = api_result.into_parts();
    let processed = match result {
        ApiCallResult::Success { value } => ProcessedRequest {
            request,
            outcome: RequestOutcome::Fulfilled { value },
        },
        ApiCallResult::Failure {
            kind,
            error_message,
        } => ProcessedRequest {
            request: request.with_status(RequestStatus::Errored, Some(error_message.clone())),
            outcome: RequestOutcome::Errored {
                kind,
                message: error_message,
            },
        },
    };
    (logs, processed)
}
