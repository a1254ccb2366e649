use clap::Parser;

use sf_docs::SfDocsError;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    sf_docs::logging::init(cli.verbose);

    if let Err(e) = cli::run(cli).await {
        eprintln!("error: {e:#}");
        let code = e.downcast_ref::<SfDocsError>().map_or(1, SfDocsError::exit_code);
        std::process::exit(code);
    }
}
