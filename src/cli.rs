use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SUBJECT: &str = "mailto:you@example.com";

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve {
        addr: SocketAddr,
        config: taskpush::config::AppConfig,
    },
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Init(args)) => RunOutcome::Exit(run_init(args)),
        Some(Command::DeactivateAll) => RunOutcome::Exit(run_deactivate_all(cli.data_dir)),
        None => RunOutcome::Serve {
            addr: cli.addr,
            config: app_config(cli.serve, cli.data_dir),
        },
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "taskpush",
    version,
    about = "Task list server with Web Push notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "TASKPUSH_ADDR", default_value = DEFAULT_ADDR)]
    addr: SocketAddr,
    /// Directory for the task and subscription snapshots.
    #[arg(long, env = "TASKPUSH_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "Task Manager PWA")]
    app_name: String,
    #[arg(long, default_value = "Tasks")]
    short_name: String,
    #[arg(long)]
    icon_192: Option<PathBuf>,
    #[arg(long)]
    icon_512: Option<PathBuf>,
    #[arg(long, env = "TASKPUSH_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "TASKPUSH_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "TASKPUSH_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
    /// Mark every stored push subscription inactive.
    DeactivateAll,
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn app_config(args: ServeArgs, data_dir: Option<PathBuf>) -> taskpush::config::AppConfig {
    taskpush::config::AppConfig {
        data_dir,
        app_name: args.app_name,
        short_name: args.short_name,
        icon_192: args.icon_192,
        icon_512: args.icon_512,
        vapid_private_key: args.vapid_private_key,
        vapid_public_key: args.vapid_public_key,
        vapid_subject: args.vapid_subject,
    }
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match taskpush::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("TASKPUSH_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("TASKPUSH_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("TASKPUSH_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace TASKPUSH_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn run_deactivate_all(data_dir: Option<PathBuf>) -> i32 {
    let Some(data_dir) = data_dir else {
        eprintln!("error: --data-dir is required for deactivate-all");
        return 2;
    };
    let store = match taskpush::store::Store::open(&data_dir) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    match store.subscriptions().deactivate_all() {
        Ok(count) => {
            println!("deactivated {count} subscription(s)");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}
