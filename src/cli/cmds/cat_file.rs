use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::object::Object;

use clap::{Arg, ArgGroup, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("cat-file")
        .about("Provide content, type, or size information for a stored object")
        .arg(
            Arg::with_name("t")
                .short("t")
                .help("Show the object's type"),
        )
        .arg(
            Arg::with_name("s")
                .short("s")
                .help("Show the object's size"),
        )
        .arg(
            Arg::with_name("p")
                .short("p")
                .help("Pretty-print the object's content"),
        )
        .group(
            ArgGroup::with_name("mode")
                .args(&["t", "s", "p"])
                .required(true),
        )
        .arg(
            Arg::with_name("object")
                .required(true)
                .help("The object ID (or a unique prefix of it)"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let prefix = args.value_of("object").unwrap();
    // unwrap: clap enforces `required(true)`

    let repo = find_repo::from_path(&app.cwd)?;
    let (_, object) = repo.objects().read(prefix)?;

    if args.is_present("t") {
        writeln!(app, "{}", object.kind())?;
    } else if args.is_present("s") {
        writeln!(app, "{}", object.payload().len())?;
    } else {
        pretty_print(app, &object)?;
    }

    Ok(())
}

fn pretty_print(app: &mut App, object: &Object) -> Result<()> {
    match object {
        Object::Blob(data) => app.write_all(data)?,
        Object::Tree(tree) => {
            for entry in tree.entries() {
                let kind = if entry.mode.is_tree() { "tree" } else { "blob" };
                writeln!(
                    app,
                    "{:0>6} {} {}\t{}",
                    entry.mode.to_octal_string(),
                    kind,
                    entry.id,
                    entry.name
                )?;
            }
        }
        Object::Commit(commit) => app.write_all(&commit.to_payload())?,
    }

    Ok(())
}
