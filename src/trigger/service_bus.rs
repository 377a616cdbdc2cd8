// Service Bus queue trigger
// Processes one queue message per invocation and reports progress to the host

use std::time::Duration;

use crate::config::TriggerConfig;
use crate::invocation::{InvocationRequest, InvocationResponse, MetadataTypeMismatch};
use crate::logger;

pub const START_LOG: &str = "Rust ServiceBus Queue trigger start processing a message";
pub const END_LOG: &str = "Rust ServiceBus Queue trigger end processing a message";

const MESSAGE_ID: &str = "MessageId";
const ENQUEUED_TIME_UTC: &str = "EnqueuedTimeUtc";
const DELIVERY_COUNT: &str = "DeliveryCount";

/// Handler for queue trigger invocations
///
/// Holds no mutable state; concurrent invocations share one instance.
#[derive(Debug, Clone)]
pub struct QueueTriggerHandler {
    message_binding: String,
    processing_delay: Duration,
}

impl QueueTriggerHandler {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            message_binding: config.message_binding.clone(),
            processing_delay: config.processing_delay(),
        }
    }

    /// Process one invocation
    ///
    /// Always produces a response: metadata of the wrong type is reported in
    /// the logs instead of failing the invocation.
    pub async fn invoke(&self, request: &InvocationRequest) -> InvocationResponse {
        let mut logs = Vec::with_capacity(3);

        let message = request.message(&self.message_binding);
        logs.push(START_LOG.to_string());
        match &message {
            Some(payload) => logger::log_invocation(&format!("{START_LOG}: {payload}")),
            None => logger::log_invocation(&format!("{START_LOG}: <no message>")),
        }

        match request.metadata_str(MESSAGE_ID) {
            Ok(Some(id)) => {
                let line = format!("{MESSAGE_ID}: {id}");
                logger::log_invocation(&line);
                logs.push(line);
            }
            Ok(None) => {}
            Err(MetadataTypeMismatch { key, expected, found }) => {
                logger::log_warning(&format!(
                    "Metadata {key} is {found}, expected {expected}; not reporting it"
                ));
                logs.push(format!("{key}: unexpected {found} value"));
            }
        }

        // Diagnostic stream only, these never reach the returned logs
        for key in [ENQUEUED_TIME_UTC, DELIVERY_COUNT] {
            if let Some(value) = request.metadata_value(key) {
                logger::log_invocation_metadata(key, value);
            }
        }

        tokio::time::sleep(self.processing_delay).await;

        logs.push(END_LOG.to_string());
        logger::log_invocation(END_LOG);

        InvocationResponse::from_logs(logs)
    }
}
