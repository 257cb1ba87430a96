use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::repo::HeadState;

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("commit")
        .about("Record the index as a new commit")
        .arg(
            Arg::with_name("message")
                .short("m")
                .long("message")
                .value_name("msg")
                .required(true)
                .help("Use the given message as the commit message"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let message = args.value_of("message").unwrap();
    // unwrap: clap enforces `required(true)`

    let repo = find_repo::from_path(&app.cwd)?;
    let id = repo.commit(message)?;

    let subject = message.lines().next().unwrap_or_default();
    match repo.refs()?.head.state() {
        HeadState::Symbolic(branch) => writeln!(app, "[{} {}] {}", branch, id, subject)?,
        HeadState::Detached(_) => writeln!(app, "[detached HEAD {}] {}", id, subject)?,
    }

    Ok(())
}
