use super::super::args::*;
use crate::exit_codes::COMPLETED;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Assess(args) => super::assess::run(args).await,
        Command::Prompt(args) => super::prompt::run(args).await,
        Command::Tier(args) => super::tier::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(COMPLETED)
        }
    }
}
