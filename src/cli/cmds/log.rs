use std::io::Write;

use crate::{find_repo, App, Result};

use clap::{ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("log").about("Show commit history from HEAD")
}

pub(crate) fn run(app: &mut App, _args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    for (n, entry) in repo.log()?.enumerate() {
        let entry = entry?;
        if n > 0 {
            writeln!(app)?;
        }

        if entry.decoration.is_empty() {
            writeln!(app, "commit {}", entry.id)?;
        } else {
            writeln!(app, "commit {} ({})", entry.id, entry.decoration)?;
        }

        let author = entry.commit.author();
        writeln!(app, "Author: {} <{}>", author.name(), author.email())?;
        writeln!(app, "Date:   {}", author.format_date())?;
        writeln!(app)?;

        for line in entry.commit.message().lines() {
            writeln!(app, "    {}", line)?;
        }
    }

    Ok(())
}
