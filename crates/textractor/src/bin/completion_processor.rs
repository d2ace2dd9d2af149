//! Lambda entry point for the Textract completion queue.

use std::sync::Arc;

use anyhow::Context;
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use textractor::{telemetry, CompletionHandler, CompletionSettings, PipelineClients, QueueRecord};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let settings =
        CompletionSettings::from_env().context("invalid completion processor configuration")?;
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let clients = PipelineClients::from_aws(&aws, &settings.common);
    let handler = Arc::new(CompletionHandler::new(clients, settings));

    tracing::info!("completion processor ready");

    run(service_fn(move |event: LambdaEvent<SqsEvent>| {
        let handler = handler.clone();
        async move {
            let records = event
                .payload
                .records
                .into_iter()
                .map(QueueRecord::from)
                .collect();
            Ok::<_, Error>(handler.handle_batch(records).await)
        }
    }))
    .await
}
