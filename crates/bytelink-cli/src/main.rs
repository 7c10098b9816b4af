use bytelink_cli::{logging, run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&cli.command, &mut out).await {
        tracing::error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}
