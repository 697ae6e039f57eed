pub mod job;

pub use job::{execute_all_jobs, execute_job, BackupResult};
