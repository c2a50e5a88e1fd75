pub mod adapter;
pub mod config;
pub mod dispatcher;
pub mod janitor;
pub mod metrics;
pub mod normalizer;
pub mod process;
pub mod queue;
pub mod service;
pub mod testing;

pub use adapter::{
    Adapter, ConversionOptions, ConversionOutcome, Domain, Operation, ToolContext, ToolsConfig,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
    StorageConfig,
};
pub use dispatcher::{Dispatcher, RoutingError, RoutingTable};
pub use janitor::{Janitor, JanitorConfig, SweepReport};
pub use normalizer::{classify, ErrorKind, ToolFailure};
pub use process::{Invocation, ProcessError, ProcessResult, ProcessRunner, TokioProcessRunner};
pub use queue::{
    DispatchExecutor, Job, JobError, JobExecutor, JobHandle, JobSpec, JobStatus, QueueConfig,
    QueueError, QueueEvent, QueueStatus, TaskQueue,
};
pub use service::{ConversionRequest, ConversionService};
