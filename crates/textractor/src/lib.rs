pub mod analysis;
pub mod config;
pub mod error;
pub mod handler;
pub mod job;
pub mod message;
pub mod notify;
pub mod operator;
pub mod sanitize;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use analysis::{collect_blocks, AnalysisService, Block};
pub use config::{CompletionSettings, Resources, Settings, UploadSettings};
pub use error::{ConfigError, JobError, Result, TextractorError};
pub use handler::{BatchReport, CompletionHandler, PipelineClients, UploadTriggerHandler};
pub use job::{JobRecord, JobStatus, StatusDetails};
pub use message::{DecodeError, QueueRecord};
pub use notify::{Notification, NotificationPublisher};
pub use storage::ObjectStore;
pub use store::{JobFilter, JobRecordStore, UpdateOutcome};
