use std::io::Write;

use crate::{find_repo, App, Result};

use clap::{Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("ls-files")
        .about("Show the files in the index")
        .arg(
            Arg::with_name("stage")
                .short("s")
                .long("stage")
                .help("Show mode bits, object name, and stage number"),
        )
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let repo = find_repo::from_path(&app.cwd)?;
    let stage = args.is_present("stage");

    for entry in repo.staged_entries()? {
        if stage {
            // Stage number lives in the bits above the name length; always 0 here.
            writeln!(
                app,
                "{:o} {} {}\t{}",
                entry.mode.to_value(),
                entry.id,
                entry.flags >> 12,
                entry.path
            )?;
        } else {
            writeln!(app, "{}", entry.path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cmds::test_support::{init_repo, write};
    use crate::App;

    use sgit::object::Object;

    #[test]
    fn lists_sorted() {
        let dir = init_repo();
        write(dir.path(), "z", "z");
        write(dir.path(), "a/b", "b");
        App::run_in(dir.path(), vec!["add", "z", "a/b"]).unwrap();

        assert_eq!(App::run_in_str(dir.path(), vec!["ls-files"]).unwrap(), "a/b\nz\n");

        let b = Object::Blob(b"b".to_vec()).id();
        let z = Object::Blob(b"z".to_vec()).id();
        assert_eq!(
            App::run_in_str(dir.path(), vec!["ls-files", "-s"]).unwrap(),
            format!("100644 {} 0\ta/b\n100644 {} 0\tz\n", b, z)
        );
    }

    #[test]
    fn empty_index() {
        let dir = init_repo();
        assert_eq!(App::run_in_str(dir.path(), vec!["ls-files"]).unwrap(), "");
    }
}
