use std::io::Write;

use crate::{find_repo, App, Result};

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("rm")
        .about("Remove files from the index")
        .arg(
            Arg::with_name("cached")
                .long("cached")
                .required(true)
                .help("Only remove from the index; working tree files are kept"),
        )
        .arg(
            Arg::with_name("paths")
                .required(true)
                .multiple(true)
                .help("Files to remove"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    for arg in args.values_of("paths").into_iter().flatten() {
        let path = find_repo::repo_path(&repo, &app.cwd, arg)?;
        repo.unstage(&path)?;
        writeln!(app, "rm '{}'", path)?;
    }

    Ok(())
}
