//! troubleshoot CLI: Conversation panel for troubleshooting hosts

use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use troubleshoot_panel::{Answer, HostProcess, OutboundMessage, Panel, PanelConfig, UserAction};

/// Troubleshooting conversation panel driven by a host process
#[derive(Parser)]
#[command(name = "troubleshoot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a host command and show its conversation in the terminal
    Run {
        /// Panel configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to write logs while the terminal is in use
        #[arg(long, default_value = "troubleshoot.log")]
        log_file: PathBuf,

        /// Log level when RUST_LOG is not set
        #[arg(long, default_value = "info")]
        log_level: String,

        /// Host program and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        host: Vec<String>,
    },

    /// Feed a JSON-lines file of host messages through a headless panel
    Replay {
        /// File with one inbound message per line
        file: PathBuf,

        /// Type this into the prompt and submit it before replaying
        #[arg(long)]
        submit: Option<String>,

        /// Answer every yes/no question as it appears
        #[arg(long, value_enum)]
        answer: Option<AnswerArg>,

        /// Panel configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log level when RUST_LOG is not set
        #[arg(long, default_value = "warn")]
        log_level: String,
    },

    /// Print the effective panel configuration
    Config {
        /// Panel configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnswerArg {
    Yes,
    No,
}

impl From<AnswerArg> for Answer {
    fn from(arg: AnswerArg) -> Self {
        match arg {
            AnswerArg::Yes => Answer::Yes,
            AnswerArg::No => Answer::No,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            log_file,
            log_level,
            host,
        } => cmd_run(config.as_deref(), &log_file, &log_level, &host),
        Commands::Replay {
            file,
            submit,
            answer,
            config,
            log_level,
        } => cmd_replay(
            &file,
            submit,
            answer.map(Answer::from),
            config.as_deref(),
            &log_level,
        ),
        Commands::Config { config } => cmd_config(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "troubleshoot={level},troubleshoot_panel={level},troubleshoot_tui={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match log_file {
        // The terminal UI owns the screen, so logs go to a file
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| -> Box<dyn Error> { e })
}

fn cmd_run(
    config: Option<&Path>,
    log_file: &Path,
    log_level: &str,
    host: &[String],
) -> Result<(), Box<dyn Error>> {
    init_logging(log_level, Some(log_file))?;
    let config = PanelConfig::load_or_default(config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_host(config, host))
}

async fn run_host(config: PanelConfig, host: &[String]) -> Result<(), Box<dyn Error>> {
    let (process, bridge) = HostProcess::spawn(host)?;
    tracing::info!(pid = ?process.id(), "host started");

    let result = troubleshoot_tui::run_tui(config, bridge).await;
    if let Err(e) = process.shutdown().await {
        tracing::warn!(error = %e, "failed to stop host");
    }
    result
}

fn cmd_replay(
    file: &Path,
    submit: Option<String>,
    answer: Option<Answer>,
    config: Option<&Path>,
    log_level: &str,
) -> Result<(), Box<dyn Error>> {
    init_logging(log_level, None)?;
    let config = PanelConfig::load_or_default(config)?;
    let input = std::fs::read_to_string(file)?;

    let report = replay(&input, &config, submit, answer)?;

    for message in &report.outbound {
        println!("{}", message.to_json()?);
    }
    println!();
    for line in &report.transcript {
        println!("{line}");
    }
    if report.rejected > 0 {
        eprintln!("{} frame(s) rejected", report.rejected);
    }

    Ok(())
}

fn cmd_config(config: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = PanelConfig::load_or_default(config)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Result of replaying a recorded message stream.
#[derive(Debug)]
struct ReplayReport {
    outbound: Vec<OutboundMessage>,
    transcript: Vec<String>,
    rejected: usize,
}

/// Drive a headless panel with recorded host frames.
fn replay(
    input: &str,
    config: &PanelConfig,
    submit: Option<String>,
    answer: Option<Answer>,
) -> Result<ReplayReport, Box<dyn Error>> {
    let mut panel = Panel::headless(config, Vec::new())?;

    if let Some(text) = submit {
        panel.act(UserAction::EditPrompt(text));
        panel.act(UserAction::Submit);
    }

    let mut rejected = 0;
    for frame in input.lines().filter(|line| !line.trim().is_empty()) {
        if panel.receive(frame).is_err() {
            rejected += 1;
            continue;
        }
        if let (Some(answer), Some(pair)) = (answer, panel.renderer().pending_pair()) {
            panel.act(UserAction::Answer { pair, answer });
        }
    }

    Ok(ReplayReport {
        outbound: panel.renderer().sender().clone(),
        transcript: panel.renderer().transcript(),
        rejected,
    })
}
