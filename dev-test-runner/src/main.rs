use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use zero_trim::jobs::JobsResponse;
use zero_trim::path_de::from_value_with_path;
use zero_trim::Normalizer;

/// Job-service payloads in the shapes seen in the wild:
/// - empty task lists and empty detail blocks
/// - keys the models do not know about, some of them null
/// - envelopes with and without jobs
fn realistic_samples() -> Vec<Value> {
    vec![
        json!({
            "jobs": [
                {
                    "_id": "65f0c0ffee01",
                    "status": "done",
                    "issuer": "ci-bot",
                    "jobType": "deploy",
                    "createdAt": "2024-03-12T09:15:00Z",
                    "updatedAt": "2024-03-12T09:21:44Z",
                    "__v": 0,
                    "slackTs": "1710234900.000100",
                    "tasks": [
                        {
                            "taskType": "build",
                            "taskDetail": {
                                "git": "git@example.com:web/app.git",
                                "branch": "main",
                                "app": "storefront",
                                "cacheNpm": true
                            }
                        }
                    ]
                },
                {
                    "_id": "65f0c0ffee02",
                    "status": "queued",
                    "issuer": "alice",
                    "jobType": "deploy",
                    "createdAt": "2024-03-12T10:00:00Z",
                    "updatedAt": "2024-03-12T10:00:00Z",
                    "tasks": []
                }
            ],
            "count": 2,
            "offset": 0,
            "limit": 20
        }),
        json!({
            "jobs": [
                {
                    "_id": "65f0c0ffee03",
                    "status": "failed",
                    "issuer": "bob",
                    "jobType": "rollback",
                    "createdAt": "2024-03-13T18:30:00Z",
                    "updatedAt": "2024-03-13T18:31:02Z",
                    "retries": 3,
                    "lease": null,
                    "tasks": [
                        { "taskType": "restore", "taskDetail": {} }
                    ]
                }
            ],
            "count": 1,
            "offset": 40,
            "limit": 20
        }),
        json!({ "jobs": [], "count": 0, "offset": 0, "limit": 20 }),
    ]
}

/// Drop tasks with nothing to run and unknown keys that carry null, the way a
/// consumer trims a page before display.
fn prune(response: &mut JobsResponse) {
    for job in &mut response.jobs {
        job.tasks.retain(|task| !task.task_detail.git.is_empty());
        job.extra.retain(|_, value| !value.is_null());
    }
}

fn run_realistic_samples() -> Result<()> {
    for (index, sample) in realistic_samples().into_iter().enumerate() {
        let mut response: JobsResponse = from_value_with_path(sample)
            .with_context(|| format!("sample #{index}: decode"))?;
        prune(&mut response);

        let mut normalizer = Normalizer::new();
        response.normalize_each(&mut normalizer)?;
        let report = normalizer.into_report();

        for job in &response.jobs {
            if job.tasks.is_empty() && job.tasks.capacity() != 0 {
                bail!("sample #{index}: job {} kept storage for an empty task list", job.id);
            }
        }
        let empty_task_lists = response.jobs.iter().filter(|job| job.tasks.is_empty()).count();
        let collapsed_task_lists = report.collapsed.iter().filter(|path| *path == "Job.tasks").count();
        if collapsed_task_lists != empty_task_lists {
            bail!(
                "sample #{index}: {empty_task_lists} empty task lists, {collapsed_task_lists} collapsed"
            );
        }

        // A second pass must find nothing left to do.
        let once = response.clone();
        response.normalize_each(&mut Normalizer::new())?;
        if response != once {
            bail!("sample #{index}: second pass changed the record");
        }

        eprintln!(
            "✅ sample #{index}: {} records, {} fields, collapsed {:?}, cleared {:?}",
            report.records, report.fields, report.collapsed, report.cleared
        );
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

fn main() {
    if let Err(error) = run_realistic_samples() {
        eprintln!("❌ failed: {error:#}");
        std::process::exit(1);
    }
}
