use clap::Parser;
use miette::{IntoDiagnostic, Result};
use reqtrack::cli::commands::{
    auth, completions, config, cr, dashboard, file, logs, notify, project, report, user,
};
use reqtrack::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior so piping into `head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(dispatch(cli.command, cli.global))
}

/// Diagnostics go to stderr; RUST_LOG wins over --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "reqtrack=debug" } else { "reqtrack=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(command: Commands, global: GlobalOpts) -> Result<()> {
    match command {
        Commands::Login(args) => auth::run_login(args, &global).await,
        Commands::Logout => auth::run_logout(&global),
        Commands::Whoami => auth::run_whoami(&global),
        Commands::Project(cmd) => project::run(cmd, &global).await,
        Commands::Cr(cmd) => cr::run(cmd, &global).await,
        Commands::User(cmd) => user::run(cmd, &global).await,
        Commands::Notify(cmd) => notify::run(cmd, &global).await,
        Commands::Report(cmd) => report::run(cmd, &global).await,
        Commands::Dashboard(args) => dashboard::run(args, &global).await,
        Commands::Logs(args) => logs::run(args, &global).await,
        Commands::File(cmd) => file::run(cmd, &global).await,
        Commands::Config(cmd) => config::run(cmd, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
