use clap::Parser;
use mct::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler; this is also the catch-all
    // that renders unexpected failures as clean diagnostics
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
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => mct::cli::commands::init::run(args),
        Commands::Doc(cmd) => mct::cli::commands::doc::run(cmd, &global),
        Commands::Rev(cmd) => mct::cli::commands::rev::run(cmd, &global),
        Commands::Ecn(cmd) => mct::cli::commands::ecn::run(cmd, &global),
        Commands::Part(cmd) => mct::cli::commands::part::run(cmd, &global),
        Commands::Vendor(cmd) => mct::cli::commands::vendor::run(cmd, &global),
        Commands::Compare(cmd) => mct::cli::commands::compare::run(cmd, &global),
        Commands::Team(cmd) => cmd.run(&global),
        Commands::Log(args) => mct::cli::commands::log::run(args),
        Commands::Validate(args) => mct::cli::commands::validate::run(args),
        Commands::Completions(args) => mct::cli::commands::completions::run(args),
    }
}
