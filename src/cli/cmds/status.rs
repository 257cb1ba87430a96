use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::repo::HeadState;

use clap::{ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("status").about("Show staged files that differ from the working tree")
}

pub(crate) fn run(app: &mut App, _args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    match repo.refs()?.head.state() {
        HeadState::Symbolic(branch) => writeln!(app, "On branch {}", branch)?,
        HeadState::Detached(id) => writeln!(app, "HEAD detached at {}", id)?,
    }

    let status = repo.status()?;
    if status.is_clean() {
        writeln!(app, "Working tree matches the index")?;
        return Ok(());
    }

    writeln!(app, "Changes not staged for commit:")?;
    for path in &status.modified {
        writeln!(app, "\tmodified:   {}", path)?;
    }
    for path in &status.deleted {
        writeln!(app, "\tdeleted:    {}", path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::cmds::test_support::{repo_with_commit, write};
    use crate::App;

    #[test]
    fn clean() {
        let dir = repo_with_commit();
        assert_eq!(
            App::run_in_str(dir.path(), vec!["status"]).unwrap(),
            "On branch master\nWorking tree matches the index\n"
        );
    }

    #[test]
    fn modified_and_deleted() {
        let dir = repo_with_commit();
        write(dir.path(), "c", "c");
        App::run_in(dir.path(), vec!["add", "c"]).unwrap();

        write(dir.path(), "a/b.txt", "changed");
        fs::remove_file(dir.path().join("c")).unwrap();

        assert_eq!(
            App::run_in_str(dir.path(), vec!["status"]).unwrap(),
            "On branch master\nChanges not staged for commit:\n\tmodified:   a/b.txt\n\tdeleted:    c\n"
        );
    }
}
