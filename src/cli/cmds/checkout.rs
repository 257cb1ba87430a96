use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::repo::HeadTarget;

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("checkout")
        .about("Switch branches or restore working tree files")
        .arg(
            Arg::with_name("cached")
                .long("cached")
                .help("Only update HEAD and the index; leave the working tree alone"),
        )
        .arg(
            Arg::with_name("target")
                .required(true)
                .help("Branch, tag, or commit to check out"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let name = args.value_of("target").unwrap();
    // unwrap: clap enforces `required(true)`

    let repo = find_repo::from_path(&app.cwd)?;
    match repo.checkout(name, !args.is_present("cached"))? {
        HeadTarget::Branch(branch) => writeln!(app, "Switched to branch '{}'", branch)?,
        HeadTarget::Commit(id) => writeln!(app, "HEAD is now at {}", id)?,
    }

    Ok(())
}
