use crate::model::{student_gradebook_from_wire, GradebookData, WireCourseGradebooks, WireGradeTree};
use anyhow::{anyhow, bail, Context};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Read-only access to the backend's gradebook endpoints.
pub trait GradebookSource {
    fn course_gradebooks(&self, course_id: &str) -> anyhow::Result<GradebookData>;
    fn student_gradebook(&self, student_id: &str, course_id: &str) -> anyhow::Result<GradebookData>;
}

#[derive(Debug, Clone)]
pub struct HttpGradebookSource {
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl HttpGradebookSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gradeviewd/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        tracing::info!(%url, %status, "gradebook fetch");
        let raw = response
            .text()
            .with_context(|| format!("read body of GET {url}"))?;
        if !status.is_success() {
            bail!("backend error ({status}) for GET {url}");
        }
        serde_json::from_str(&raw).with_context(|| format!("decode gradebook from GET {url}"))
    }
}

impl GradebookSource for HttpGradebookSource {
    fn course_gradebooks(&self, course_id: &str) -> anyhow::Result<GradebookData> {
        let url = self.endpoint(&["gradebook", "getGradebooksOfCourseFormatted", course_id])?;
        let wire: WireCourseGradebooks = self.get_json(url)?;
        Ok(wire.into_model())
    }

    fn student_gradebook(&self, student_id: &str, course_id: &str) -> anyhow::Result<GradebookData> {
        let url = self.endpoint(&["gradebook", "getGradebook", student_id, course_id])?;
        let wire: WireGradeTree = self.get_json(url)?;
        Ok(student_gradebook_from_wire(wire, course_id))
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid backend url: {raw}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("backend url must be http or https, got {other}"),
    }
}
