//! Client for the job-status service and the records it returns.
//!
//! ```no_run
//! use zero_trim::jobs::{JobClient, JobQuery};
//!
//! let client = JobClient::new().with_host("localhost:8080").with_scheme("http");
//! let mut resp = client.fetch_jobs(&JobQuery::new().with_limit(10))?;
//! for job in resp.jobs.iter_mut() {
//!     zero_trim::normalize(job)?;
//! }
//! # Ok::<(), zero_trim::Error>(())
//! ```

mod client;
mod models;

pub use client::{JobClient, JobQuery, DEFAULT_HOST, DEFAULT_SCHEME, DEFAULT_TIMEOUT};
pub use models::{Job, JobsResponse, Task, TaskDetail};
