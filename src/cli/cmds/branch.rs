use std::io::Write;

use crate::{find_repo, App, Result};

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("branch")
        .about("List, create, or delete branches")
        .arg(
            Arg::with_name("list")
                .short("l")
                .long("list")
                .conflicts_with_all(&["delete", "name"])
                .help("List branches"),
        )
        .arg(
            Arg::with_name("delete")
                .short("D")
                .value_name("branch")
                .conflicts_with("name")
                .help("Delete the named branch"),
        )
        .arg(Arg::with_name("name").help("Name of the branch to create"))
        .arg(
            Arg::with_name("start")
                .requires("name")
                .help("Branch, tag, or commit the new branch points at (default HEAD)"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;

    if let Some(name) = args.value_of("delete") {
        let id = repo.refs()?.branches.get(name)?;
        repo.delete_branch(name)?;
        writeln!(app, "Deleted branch {} (was {}).", name, id)?;
    } else if let Some(name) = args.value_of("name") {
        repo.create_branch(name, args.value_of("start"))?;
    } else {
        let refs = repo.refs()?;
        let current = refs.head.branch_name();

        for name in refs.branches.list_all()?.keys() {
            let marker = if Some(name.as_str()) == current { '*' } else { ' ' };
            writeln!(app, "{} {}", marker, name)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cmds::test_support::repo_with_commit;
    use crate::App;

    #[test]
    fn create_list_delete() {
        let dir = repo_with_commit();

        App::run_in(dir.path(), vec!["branch", "topic"]).unwrap();
        assert_eq!(
            App::run_in_str(dir.path(), vec!["branch"]).unwrap(),
            "* master\n  topic\n"
        );
        assert_eq!(
            App::run_in_str(dir.path(), vec!["branch", "-l"]).unwrap(),
            "* master\n  topic\n"
        );

        let out = App::run_in_str(dir.path(), vec!["branch", "-D", "topic"]).unwrap();
        assert!(out.starts_with("Deleted branch topic (was "), "{}", out);
        assert_eq!(App::run_in_str(dir.path(), vec!["branch"]).unwrap(), "* master\n");
    }

    #[test]
    fn errors() {
        let dir = repo_with_commit();

        let err = App::run_in(dir.path(), vec!["branch", "master"]).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{}", err);

        let err = App::run_in(dir.path(), vec!["branch", "-D", "master"]).unwrap_err();
        assert!(err.to_string().contains("HEAD follows"), "{}", err);

        let err = App::run_in(dir.path(), vec!["branch", "-D", "nope"]).unwrap_err();
        assert!(err.to_string().contains("not found"), "{}", err);
    }
}
