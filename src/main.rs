use std::env;
use std::io;
use std::process::ExitCode;

use plastic_market::csv::{read_commands, write_transactions};
use plastic_market::replay::replay;
use plastic_market::{InMemoryLedger, Marketplace, ParticipantId};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Identity that deploys, and therefore owns, the replayed marketplace.
const DEPLOYER: ParticipantId = 0;
/// Identity of the marketplace on the token ledger.
const MARKET_ADDRESS: ParticipantId = ParticipantId::MAX;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: plastic-market <calls.csv>");
        return ExitCode::from(2);
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let commands = match read_commands(path) {
        Ok(commands) => commands,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut market = Marketplace::new(DEPLOYER, MARKET_ADDRESS);
    let mut ledger = InMemoryLedger::new();
    let (cmd_sender, cmd_receiver) = tokio::sync::mpsc::channel(16);

    tokio::task::spawn_blocking(move || {
        for result in commands {
            match result {
                Ok(command) => {
                    if cmd_sender.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    replay(&mut market, &mut ledger, ReceiverStream::new(cmd_receiver)).await;

    if let Err(e) = write_transactions(io::stdout().lock(), market.transactions()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
