use std::io::Write;

use crate::{find_repo, App, Result};

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("tag")
        .about("List, create, or delete tags")
        .arg(
            Arg::with_name("list")
                .short("l")
                .long("list")
                .conflicts_with_all(&["delete", "name"])
                .help("List tags"),
        )
        .arg(
            Arg::with_name("delete")
                .short("D")
                .value_name("tag")
                .conflicts_with("name")
                .help("Delete the named tag"),
        )
        .arg(Arg::with_name("name").help("Name of the tag to create"))
        .arg(
            Arg::with_name("commit")
                .requires("name")
                .help("Branch, tag, or commit to tag (default HEAD)"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    if let Some(name) = args.value_of("delete") {
        let id = repo.refs()?.tags.get(name)?;
        repo.delete_tag(name)?;
        writeln!(app, "Deleted tag '{}' (was {})", name, id)?;
    } else if let Some(name) = args.value_of("name") {
        repo.create_tag(name, args.value_of("commit"))?;
    } else {
        for name in repo.tags()?.keys() {
            writeln!(app, "{}", name)?;
        }
    }

    Ok(())
}
