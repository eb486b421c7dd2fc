use crate::client::HttpGradebookSource;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Parser)]
#[command(author, version, about = "Gradebook view sidecar")]
pub struct Cli {
    /// Base URL of the LMS backend (e.g. https://lms.example.com/api).
    #[arg(long, env = "GRADEVIEWD_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout for backend fetches.
    #[arg(long, env = "GRADEVIEWD_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve JSON-lines requests on stdin/stdout (default).
    Serve,
    /// Fetch one gradebook and print it as text.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long)]
    pub course_id: String,

    /// Show a single student's gradebook instead of the whole course.
    #[arg(long)]
    pub student_id: Option<String>,

    /// Expand every subject, semester and quarter.
    #[arg(long)]
    pub expand_all: bool,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn backend(&self) -> anyhow::Result<Option<HttpGradebookSource>> {
        self.base_url
            .as_deref()
            .map(|url| HttpGradebookSource::new(url, self.timeout()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_backend() {
        let cli = Cli::try_parse_from(["gradeviewd"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn parses_show_arguments() {
        let cli = Cli::try_parse_from([
            "gradeviewd",
            "--base-url",
            "http://127.0.0.1:8080",
            "show",
            "--course-id",
            "c1",
            "--expand-all",
        ])
        .expect("parse");
        let Some(Command::Show(args)) = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(args.course_id, "c1");
        assert!(args.student_id.is_none());
        assert!(args.expand_all);
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn invalid_backend_url_is_rejected() {
        let cli = Cli::try_parse_from(["gradeviewd", "--base-url", "file:///tmp/x"]).expect("parse");
        assert!(cli.backend().is_err());
    }
}
