use std::fs;
use std::io::Write;

use crate::{App, Result};

use sgit::repo::OnDisk;

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("init")
        .about("Create an empty repository")
        .arg(
            Arg::with_name("directory")
                .required(true)
                .help("The directory to create"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let dir = args.value_of("directory").unwrap();
    // unwrap: clap enforces `required(true)`
    let path = app.cwd.join(dir);

    fs::create_dir_all(&path)?;
    let repo = OnDisk::init(&path)?;

    writeln!(
        app,
        "Initialized empty sgit repository in {}",
        repo.git_dir().display()
    )?;

    Ok(())
}
