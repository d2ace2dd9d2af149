//! Operator CLI for the document OCR pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use clap::{Parser, Subcommand};
use textractor::config::resources::DEFAULT_RESOURCES_FILE;
use textractor::config::{load_resources, Resources};
use textractor::operator;
use textractor::storage::S3ObjectStore;
use textractor::store::DynamoJobStore;
use textractor::{telemetry, JobFilter, JobRecordStore, JobStatus};

#[derive(Parser)]
#[command(name = "textractor", version, about = "Operate the document OCR pipeline")]
struct Cli {
    /// Resources file written by the deployment
    #[arg(long, global = true, default_value = DEFAULT_RESOURCES_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a document and start a job
    Submit {
        file: PathBuf,
        /// Job id to use instead of a random UUID
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Show one job record
    Status { job_id: String },
    /// List job records, newest first
    List {
        #[arg(long)]
        status: Option<JobStatus>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the analysis result of a completed job
    Result {
        job_id: String,
        /// Print the detected lines instead of block counts
        #[arg(long)]
        text: bool,
        /// Write the raw result JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let resources = load_resources(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let aws = load_aws(&resources).await;

    match cli.command {
        Command::Submit { file, job_id } => {
            let objects = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws));
            let submission =
                operator::submit_document(&objects, &resources.document_bucket, &file, job_id)
                    .await?;
            println!("Submitted job {}", submission.job_id);
            println!(
                "  s3://{}/{} ({})",
                resources.document_bucket, submission.key, submission.content_type
            );
        }
        Command::Status { job_id } => {
            let store = job_store(&aws, &resources);
            match store.get(&job_id).await? {
                Some(record) => print!("{}", operator::format_job_details(&record)),
                None => anyhow::bail!("job {} not found", job_id),
            }
        }
        Command::List { status, limit } => {
            let store = job_store(&aws, &resources);
            let records = store.list(&JobFilter { status, limit }).await?;
            print!("{}", operator::format_job_table(&records));
        }
        Command::Result {
            job_id,
            text,
            output,
        } => {
            let objects = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws));
            let bucket = &resources.output_bucket;

            if let Some(path) = output {
                let body = operator::fetch_result_raw(&objects, bucket, &job_id).await?;
                tokio::fs::write(&path, &body)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Wrote {} bytes to {}", body.len(), path.display());
                return Ok(());
            }

            let blocks = operator::fetch_result(&objects, bucket, &job_id).await?;
            if text {
                println!("{}", operator::line_text(&blocks));
            } else {
                println!("{} blocks", blocks.len());
                for (block_type, count) in operator::block_counts(&blocks) {
                    println!("  {:<20} {}", block_type, count);
                }
            }
        }
    }

    Ok(())
}

async fn load_aws(resources: &Resources) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &resources.region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}

fn job_store(aws: &aws_config::SdkConfig, resources: &Resources) -> DynamoJobStore {
    DynamoJobStore::new(aws_sdk_dynamodb::Client::new(aws), &resources.jobs_table)
}
