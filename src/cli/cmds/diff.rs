use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::repo::DiffInput;

use clap::{ArgMatches, SubCommand};
use similar::TextDiff;

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("diff").about("Show changes between the index and the working tree")
}

pub(crate) fn run(app: &mut App, _args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    for input in repo.diff_inputs()? {
        write!(app, "{}", unified(&input))?;
    }

    Ok(())
}

fn unified(input: &DiffInput) -> String {
    let staged = joined(&input.staged_lines);
    let working = joined(&input.working_lines);

    TextDiff::from_lines(&staged, &working)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", input.path), &format!("b/{}", input.path))
        .to_string()
}

fn joined(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{}\n", line)).collect()
}
