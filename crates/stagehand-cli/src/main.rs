mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{InstallArgs, TargetArgs, EXIT_FAILURE, EXIT_PLAN_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stagehand",
    version,
    about = "Stage build artifacts into a flat per-target directory layout"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Only print warnings and errors.
    #[arg(short, long, default_value_t = false, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Stage the artifacts of one build unit.
    Stage {
        /// Source directory of the unit (holds `data/`).
        source_dir: PathBuf,
        /// Build output directory of the unit.
        output_dir: PathBuf,
        /// Display name for the unit.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        install: InstallArgs,
    },
    /// Stage every unit listed in a plan file.
    StagePlan {
        /// Path to the plan TOML file.
        #[arg(id = "plan_file", value_name = "PLAN", default_value = "stagehand.toml")]
        plan: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        install: InstallArgs,
    },
    /// Print the resolved target triple and destination directory.
    Describe {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        install: InstallArgs,
    },
    /// Report how each file would be classified.
    Classify {
        /// Files to classify.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        target: TargetArgs,
        /// Plan file supplying extra extension rules.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STAGEHAND_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json = cli.json;

    let result = match cli.command {
        Commands::Stage {
            source_dir,
            output_dir,
            name,
            target,
            install,
        } => commands::stage::run(
            &source_dir,
            &output_dir,
            name.as_deref(),
            &target,
            &install,
            json,
        ),
        Commands::StagePlan {
            plan,
            target,
            install,
        } => commands::stage_plan::run(&plan, &target, &install, json),
        Commands::Describe { target, install } => commands::describe::run(&target, &install, json),
        Commands::Classify {
            files,
            target,
            plan,
        } => commands::classify::run(&files, &target, plan.as_deref(), json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("plan error:")
                || msg.starts_with("target error:")
                || msg.starts_with("failed to parse plan")
                || msg.starts_with("failed to read plan")
            {
                EXIT_PLAN_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
