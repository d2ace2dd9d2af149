//! Lambda entry point for the upload queue.

use std::sync::Arc;

use anyhow::Context;
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use textractor::{telemetry, PipelineClients, QueueRecord, UploadSettings, UploadTriggerHandler};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let settings = UploadSettings::from_env().context("invalid document processor configuration")?;
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let clients = PipelineClients::from_aws(&aws, &settings.common);
    let handler = Arc::new(UploadTriggerHandler::new(clients, settings));

    tracing::info!("document processor ready");

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
