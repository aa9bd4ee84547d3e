use clap::Parser;

use geocountry::config::args::{Args, Command};
use geocountry::config::StaticConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    match args.command() {
        #[cfg(feature = "server")]
        Command::Serve => {
            let config = StaticConfig::load(&args.config);
            // Guard must outlive the server so buffered logs are flushed
            let _guard = geocountry::system::init_logging(&config.logging)?;
            geocountry::runtime::modes::run_server(&config).await
        }
        #[cfg(feature = "cli")]
        Command::Lookup { ips } => {
            geocountry::runtime::modes::init_cli_logging();
            let config = StaticConfig::load(&args.config);
            let failures = geocountry::runtime::modes::run_lookup(&config, &ips).await?;
            if failures > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(feature = "cli")]
        Command::Config { output } => {
            geocountry::runtime::modes::print_sample_config(output.as_deref())
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("{:?} is not available in this build", other),
    }
}
