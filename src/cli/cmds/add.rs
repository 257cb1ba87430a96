use crate::{find_repo, App, Result};

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("add")
        .about("Add file contents to the index")
        .arg(
            Arg::with_name("paths")
                .required(true)
                .multiple(true)
                .help("Files to add"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    for arg in args.values_of("paths").into_iter().flatten() {
        let path = find_repo::repo_path(&repo, &app.cwd, arg)?;
        repo.stage_file(&path)?;
    }

    Ok(())
}
