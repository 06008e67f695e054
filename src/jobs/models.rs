use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Normalizer, Result};

/// Envelope returned by the job service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<Job>,
    pub count: i64,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Job {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
    pub status: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub issuer: String,
    pub job_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "__v")]
    pub version: i64,
    pub slack_ts: String,
    /// Keys the model does not know about.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    pub task_type: String,
    pub task_detail: TaskDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskDetail {
    pub git: String,
    pub build_env: String,
    pub pool: String,
    pub local_config: String,
    pub cache_npm: bool,
    pub use_jukwaapack_cloud_for_code_path: bool,
    pub source_map: bool,
    pub codepath: String,
    pub branch: String,
    pub app: String,
    pub category: String,
}

crate::impl_record!(JobsResponse { jobs, count, offset, limit });

impl JobsResponse {
    /// Normalize the envelope, then every job in it as a record of its own.
    /// The envelope's walk stops at the job list like any collection.
    pub fn normalize_each(&mut self, normalizer: &mut Normalizer) -> Result<()> {
        normalizer.normalize(self)?;
        for job in &mut self.jobs {
            normalizer.normalize(job)?;
        }
        Ok(())
    }
}

crate::impl_record!(Job {
    tasks, status, id, issuer, job_type, created_at, updated_at, version, slack_ts, extra,
});

crate::impl_record!(Task { task_type, task_detail });

crate::impl_record!(TaskDetail {
    git, build_env, pool, local_config, cache_npm, use_jukwaapack_cloud_for_code_path,
    source_map, codepath, branch, app, category,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_de::from_str_with_path;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "jobs": [
            {
                "tasks": [
                    {
                        "taskType": "deploy",
                        "taskDetail": {
                            "git": "git@example.com:web/app.git",
                            "buildEnv": "stage",
                            "pool": "default",
                            "cacheNpm": true,
                            "branch": "main",
                            "app": "web"
                        }
                    }
                ],
                "status": "done",
                "_id": "65a1f0",
                "issuer": "alice",
                "jobType": "release",
                "createdAt": "2024-01-12T10:00:00Z",
                "updatedAt": "2024-01-12T10:05:30Z",
                "__v": 2,
                "slackTs": "1705053600.000100"
            },
            {
                "tasks": [],
                "status": "queued",
                "_id": "65a1f1",
                "issuer": "bob",
                "jobType": "release",
                "createdAt": "2024-01-12T11:00:00Z",
                "updatedAt": "2024-01-12T11:00:00Z",
                "__v": 0,
                "priority": "low"
            }
        ],
        "count": 2,
        "offset": 0,
        "limit": 20
    }"#;

    #[test]
    fn decodes_wire_names() {
        let resp: JobsResponse = from_str_with_path(SAMPLE).unwrap();
        assert_eq!(resp.count, 2);
        let first = &resp.jobs[0];
        assert_eq!(first.id, "65a1f0");
        assert_eq!(first.version, 2);
        assert_eq!(first.slack_ts, "1705053600.000100");
        assert_eq!(first.tasks[0].task_detail.build_env, "stage");
        assert!(first.tasks[0].task_detail.cache_npm);
        assert!(first.extra.is_empty());
        assert_eq!(resp.jobs[1].extra.get("priority"), Some(&Value::from("low")));
    }

    #[test]
    fn normalizing_the_envelope_does_not_enter_the_job_list() {
        let mut resp: JobsResponse = from_str_with_path(SAMPLE).unwrap();
        let before = resp.clone();
        let mut n = Normalizer::new();
        n.normalize(&mut resp).unwrap();
        assert_eq!(resp, before);
        assert_eq!(n.report().records, 1);
        assert!(n.report().collapsed.is_empty());
    }

    #[test]
    fn normalizing_a_job_collapses_its_empty_parts() {
        let resp: JobsResponse = from_str_with_path(SAMPLE).unwrap();

        let mut queued = resp.jobs[1].clone();
        let mut n = Normalizer::new();
        n.normalize(&mut queued).unwrap();
        assert_eq!(n.report().collapsed, vec!["Job.tasks"]);
        assert_eq!(queued.tasks.capacity(), 0);

        let mut done = resp.jobs[0].clone();
        let mut n = Normalizer::new();
        n.normalize(&mut done).unwrap();
        assert_eq!(n.report().collapsed, vec!["Job.extra"]);
        assert_eq!(done, resp.jobs[0]);
    }

    #[test]
    fn each_job_is_normalized_under_the_envelope() {
        let mut resp: JobsResponse = from_str_with_path(SAMPLE).unwrap();
        let mut n = Normalizer::new();
        resp.normalize_each(&mut n).unwrap();
        // the envelope and both jobs; tasks sit inside a list
        assert_eq!(n.report().records, 3);
        assert_eq!(n.report().collapsed, vec!["Job.extra", "Job.tasks"]);
    }

    #[test]
    fn missing_timestamps_stay_missing() {
        let mut job: Job = from_str_with_path(r#"{"_id": "x", "createdAt": "2024-01-12T10:00:00Z"}"#).unwrap();
        assert!(job.created_at.is_some());
        assert_eq!(job.updated_at, None);

        let mut n = Normalizer::new();
        n.normalize(&mut job).unwrap();
        assert_eq!(n.report().cleared, vec!["Job.updated_at"]);
        assert_eq!(job.updated_at, None);

        let out = serde_json::to_value(&job).unwrap();
        assert!(out.get("updatedAt").is_none());
        assert_eq!(out["createdAt"], "2024-01-12T10:00:00Z");
    }

    #[test]
    fn pruned_parts_release_their_storage() {
        let mut job: Job = from_str_with_path(
            r#"{"_id": "x", "tasks": [{"taskType": ""}, {"taskType": ""}], "lease": null}"#,
        )
        .unwrap();
        job.tasks.retain(|task| !task.task_type.is_empty());
        job.extra.retain(|_, value| !value.is_null());
        assert!(job.tasks.is_empty());
        assert!(job.tasks.capacity() > 0);

        let mut n = Normalizer::new();
        n.normalize(&mut job).unwrap();
        assert_eq!(job.tasks.capacity(), 0);
        assert_eq!(n.report().collapsed, vec!["Job.tasks", "Job.extra"]);
    }
}
