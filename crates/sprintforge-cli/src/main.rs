//! `sprintforge` command-line entry point

use anyhow::Context;
use sprintforge_cli::{command, init_tracing, load_config, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches).context("loading configuration")?;
    let app = App::connect(config)?;

    match matches.subcommand() {
        Some(("baselines", args)) => {
            let mut stdout = std::io::stdout();
            app.run(args, &mut stdout).await
        }
        _ => Ok(()),
    }
}
