use clap::Parser;
use miette::Result;
use bomsim::cli::{Cli, Commands};
use bomsim::core::{logging, Config};

fn main() -> Result<()> {
    // Terminate quietly on broken pipes (`bomsim tree ... | head`)
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
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    logging::init(global.verbose, global.quiet);

    let config = Config::load(global.config.as_deref());
    let format = global.format.resolve(config.default_format.as_deref());

    match cli.command {
        Commands::Validate(args) => bomsim::cli::commands::validate::run(args, &global, format),
        Commands::Rollup(args) => bomsim::cli::commands::rollup::run(args, &global, format),
        Commands::Tree(args) => bomsim::cli::commands::tree::run(args, &global, format, &config),
        Commands::Sim(args) => bomsim::cli::commands::sim::run(args, &global, format, &config),
        Commands::Config(cmd) => bomsim::cli::commands::config::run(cmd, &global, format, &config),
        Commands::Completions(args) => bomsim::cli::commands::completions::run(args),
    }
}
