use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use ptydrive::{CommandSpec, Process, Script, ScriptWriter, SessionFile, Transcript};

/// Run a command under a pseudo-terminal and type a script into it.
#[derive(Debug, Parser)]
#[command(name = "ptydrive", version, about)]
struct Cli {
    /// TOML session file (command, args, lines, env, cwd)
    #[arg(long, value_name = "FILE")]
    session: Option<PathBuf>,

    /// Line to type into the child; repeatable, sent in order after the
    /// session file's lines
    #[arg(long = "send", value_name = "LINE")]
    send: Vec<String>,

    /// Kill the child if it has not exited after this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Capture output instead of forwarding it to stdout; dumped to
    /// stderr only if the child fails
    #[arg(short, long)]
    quiet: bool,

    /// Command to run (overrides the session file's command)
    command: Option<String>,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let session = match &cli.session {
        Some(path) => SessionFile::load(path)
            .with_context(|| format!("loading session file {}", path.display()))?,
        None => SessionFile::default(),
    };

    let program = cli
        .command
        .clone()
        .or_else(|| (!session.command.is_empty()).then(|| session.command.clone()))
        .context("no command given; pass one on the command line or via --session")?;
    let args = if cli.command.is_some() {
        cli.args.clone()
    } else {
        session.args.clone()
    };

    let mut spec = CommandSpec::new(program).args(args);
    for (key, value) in &session.env {
        spec = spec.env(key, value);
    }
    if let Some(dir) = &session.cwd {
        spec = spec.cwd(dir);
    }

    let mut lines = session.lines.clone();
    lines.extend(cli.send.iter().cloned());
    let script = Script::from_lines(lines);

    let mut process = Process::new(spec);
    let input = process.take_input().context("input writer already taken")?;
    let feeder = ScriptWriter::spawn(input, script);

    let transcript = cli.quiet.then(Transcript::new);
    let sink: Box<dyn Write + Send> = match &transcript {
        Some(captured) => captured.writer(),
        None => Box::new(std::io::stdout()),
    };

    if let Some(secs) = cli.timeout {
        let handle = process.shutdown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            handle.signal();
        });
    }

    process.start(sink)?;
    let status = process.wait().await?;
    let _ = feeder.await;

    if status.success() {
        return Ok(());
    }

    if let Some(captured) = &transcript {
        eprint!("{}", captured.snapshot());
    }
    std::process::exit(status.exit_code() as i32);
}
