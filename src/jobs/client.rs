use std::time::Duration;

use url::Url;

use super::models::JobsResponse;
use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "tools.stghouzz.com";
pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const JOBS_PATH: &str = "/toolsvr/jobs";

/// Connection settings for the job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobClient {
    host: String,
    scheme: String,
    timeout: Duration,
}

impl Default for JobClient {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl JobClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// `http` or `https`.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn jobs_url(&self, query: &JobQuery) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}{}", self.scheme, self.host, JOBS_PATH))?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            let mut q = url.query_pairs_mut();
            for (key, value) in &pairs {
                q.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET the job list and decode the envelope.
    pub fn fetch_jobs(&self, query: &JobQuery) -> Result<JobsResponse> {
        let url = self.jobs_url(query)?;
        tracing::debug!(%url, timeout = ?self.timeout, "fetching jobs");

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = match agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(Error::Status(code)),
            Err(ureq::Error::Transport(err)) => return Err(Error::Transport(err.to_string())),
        };
        if response.status() != 200 {
            return Err(Error::Status(response.status()));
        }

        let body = response.into_string()?;
        let jobs: JobsResponse = crate::path_de::from_str_with_path(&body)?;
        tracing::debug!(jobs = jobs.jobs.len(), count = jobs.count, "decoded jobs");
        Ok(jobs)
    }
}

/// Optional query parameters for [`JobClient::fetch_jobs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub task_type: Option<String>,
    pub issuer: Option<String>,
}

impl JobQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    // Sorted by key.
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(issuer) = &self.issuer {
            out.push(("issuer", issuer.clone()));
        }
        if let Some(limit) = self.limit {
            out.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            out.push(("offset", offset.to_string()));
        }
        if let Some(task_type) = &self.task_type {
            out.push(("taskType", task_type.clone()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn default_url_has_no_query() {
        let url = JobClient::new().jobs_url(&JobQuery::new()).unwrap();
        assert_eq!(url.as_str(), "https://tools.stghouzz.com/toolsvr/jobs");
    }

    #[test]
    fn query_is_sorted_and_encoded() {
        let client = JobClient::new().with_scheme("http").with_host("localhost:8080");
        let query = JobQuery::new()
            .with_task_type("deploy web")
            .with_limit(5)
            .with_issuer("a@b.c")
            .with_offset(10);
        let url = client.jobs_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/toolsvr/jobs?issuer=a%40b.c&limit=5&offset=10&taskType=deploy+web",
        );
    }

    #[test]
    fn bad_host_is_a_url_error() {
        let err = JobClient::new().with_host("exa mple").jobs_url(&JobQuery::new()).unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    // One-shot HTTP stub: answers the first request with `status` and `body`.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (addr, handle)
    }

    #[test]
    fn fetch_decodes_the_envelope() {
        let (addr, handle) = serve_once(
            "200 OK",
            r#"{"jobs":[{"_id":"j1","status":"done","tasks":[]}],"count":1,"offset":0,"limit":1}"#,
        );
        let client = JobClient::new().with_scheme("http").with_host(addr);
        let resp = client.fetch_jobs(&JobQuery::new().with_limit(1)).unwrap();
        assert_eq!(resp.count, 1);
        assert_eq!(resp.jobs[0].id, "j1");

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /toolsvr/jobs?limit=1 HTTP/1.1"));
    }

    #[test]
    fn non_ok_status_is_an_error() {
        let (addr, handle) = serve_once("503 Service Unavailable", "{}");
        let client = JobClient::new().with_scheme("http").with_host(addr);
        let err = client.fetch_jobs(&JobQuery::new()).unwrap_err();
        assert!(matches!(err, Error::Status(503)));
        handle.join().unwrap();
    }

    #[test]
    fn malformed_body_names_the_path() {
        let (addr, handle) = serve_once("200 OK", r#"{"jobs":[],"count":"many"}"#);
        let client = JobClient::new().with_scheme("http").with_host(addr);
        let err = client.fetch_jobs(&JobQuery::new()).unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, "count"),
            other => panic!("unexpected error: {other}"),
        }
        handle.join().unwrap();
    }
}
