//! Project/task models and their persistence.

pub mod config;
pub mod duration;
pub mod mapper;
pub mod project;
pub mod repository;
pub mod task;

pub use config::{Credentials, DbConfig};
pub use duration::{Duration, DurationCodec, TimeUnit};
pub use mapper::TaskMapper;
pub use project::Project;
pub use repository::{
    ImportReport, ProjectRepository, TaskFailure, UnknownUnitPolicy, UpdateOutcome,
};
pub use task::Task;
