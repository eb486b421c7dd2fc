mod calc;
mod client;
mod config;
mod expansion;
mod ipc;
mod logging;
mod model;
mod render;
mod view;

use anyhow::Context as _;
use clap::Parser as _;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    logging::init().context("init logging")?;

    let cli = config::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match &cli.command {
        None | Some(config::Command::Serve) => serve(&cli),
        Some(config::Command::Show(args)) => show(&cli, args),
    }
}

fn serve(cli: &config::Cli) -> anyhow::Result<()> {
    let mut state = ipc::AppState::new(cli.timeout());
    if let Some(source) = cli.backend().context("configure backend")? {
        state.backend_url = Some(source.base_url().to_string());
        state.backend = Some(Box::new(source));
    }
    tracing::info!(backend = ?state.backend_url, "gradeviewd ready");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    let mut buf: Vec<u8> = Vec::new();

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed; exiting");
                break;
            }
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(v) => v,
            Err(e) => {
                write_reply(&mut stdout, &ipc::bad_json(format!("invalid utf-8: {e}")));
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // Can't reply with an id.
            Err(e) => ipc::bad_json(e.to_string()),
        };
        write_reply(&mut stdout, &resp);
    }

    tracing::info!(open_views = state.views.len(), "stdin closed; exiting");
    Ok(())
}

fn write_reply(stdout: &mut io::Stdout, resp: &serde_json::Value) {
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
    );
    let _ = stdout.flush();
}

fn show(cli: &config::Cli, args: &config::ShowArgs) -> anyhow::Result<()> {
    let source = cli
        .backend()
        .context("configure backend")?
        .context("--base-url (or GRADEVIEWD_BASE_URL) is required for show")?;

    let kind = match &args.student_id {
        Some(student_id) => view::ViewKind::Student {
            student_id: student_id.clone(),
            course_id: args.course_id.clone(),
        },
        None => view::ViewKind::Course {
            course_id: args.course_id.clone(),
        },
    };

    let mut views = view::ViewRegistry::default();
    let view_id = view::open(&mut views, &source, kind);
    let view = views
        .get_mut(&view_id)
        .context("view disappeared after open")?;
    if args.expand_all {
        if let view::LoadState::Ready(data) = &view.load {
            view.expansion.expand_all(data);
        }
    }

    let text = render::to_text(&render::render(&view.load, &view.expansion));
    let mut stdout = io::stdout();
    stdout.write_all(text.as_bytes()).context("write stdout")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}
