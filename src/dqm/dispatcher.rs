//! Sequential per-item dispatch: read parameters, build, send, collect.

use serde_json::Value;
use tracing::{debug, field, info_span, warn, Instrument, Span};

use crate::config::DqmConfig;
use crate::error::{Error, Result};

use super::builder::build_request;
use super::credentials::CredentialProvider;
use super::operation::Operation;
use super::parameters::ParameterReader;
use super::request::DqmRequest;
use super::transport::HttpTransport;

/// Batch-level options owned by the workflow host.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Credential profile name
    pub profile: String,
    /// Emit an error record for a failed item instead of aborting the batch
    pub continue_on_fail: bool,
}

impl DispatchOptions {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            continue_on_fail: false,
        }
    }

    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

pub struct Dispatcher<'a> {
    transport: &'a dyn HttpTransport,
    credentials: &'a dyn CredentialProvider,
    config: &'a DqmConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        credentials: &'a dyn CredentialProvider,
        config: &'a DqmConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
        }
    }

    /// Run every item in order; the output has one entry per item.
    pub async fn run(
        &self,
        params: &dyn ParameterReader,
        options: &DispatchOptions,
    ) -> Result<Vec<Value>> {
        let count = params.item_count();
        let mut responses = Vec::with_capacity(count);

        for index in 0..count {
            let span = info_span!("dqm_item", index, operation = field::Empty);
            match self
                .run_item(params, index, &options.profile)
                .instrument(span)
                .await
            {
                Ok(response) => responses.push(response),
                Err(e) if options.continue_on_fail => {
                    warn!(index, code = e.code(), "DQM item failed, continuing: {}", e);
                    responses.push(e.to_item_json());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(responses)
    }

    async fn run_item(
        &self,
        params: &dyn ParameterReader,
        index: usize,
        profile: &str,
    ) -> Result<Value> {
        let operation: Operation = params
            .string("operation", index)
            .filter(|op| !op.trim().is_empty())
            .ok_or_else(|| Error::missing("crownpeak", "operation"))?
            .parse()?;
        Span::current().record("operation", operation.as_str());

        let request = DqmRequest::read(operation, params, index, self.config)?;
        let credentials = self.credentials.credentials(profile).await?;
        let descriptor = build_request(&request, &credentials)?;

        debug!(
            operation = %operation,
            method = %descriptor.method,
            url = %descriptor.redacted_url(),
            "Sending DQM request"
        );

        self.transport.execute(&descriptor).await
    }
}
