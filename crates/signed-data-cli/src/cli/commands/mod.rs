use super::args::*;

pub(crate) mod verify;

use verify::PayloadKind;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let kind = match &cli.cmd {
        Command::Transaction(_) => PayloadKind::Transaction,
        Command::RenewalInfo(_) => PayloadKind::RenewalInfo,
        Command::Notification(_) => PayloadKind::Notification,
        Command::AppTransaction(_) => PayloadKind::AppTransaction,
    };
    verify::run(kind, cli.cmd.args())
}
