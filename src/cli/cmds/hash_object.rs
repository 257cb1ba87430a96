use std::fs;
use std::io::Write;

use crate::{find_repo, App, Result};

use sgit::object::{Kind, Object};

use clap::{Arg, ArgMatches, Error, ErrorKind, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> clap::App<'a, 'b> {
    SubCommand::with_name("hash-object")
        .about("Compute object ID and optionally create an object from a file")
        .arg(
            Arg::with_name("t")
                .short("t")
                .value_name("type")
                .help("Specify the type (default 'blob')"),
        )
        .arg(
            Arg::with_name("w")
                .short("w")
                .help("Actually write the object into the object database"),
        )
        .arg(
            Arg::with_name("stdin")
                .long("stdin")
                .help("Read the object from standard input instead of from a file"),
        )
        .arg(Arg::with_name("file"))
}

pub(crate) fn run(app: &mut App, args: &ArgMatches) -> Result<()> {
    let kind = kind_from_args(args)?;
    let content = content_from_args(app, args)?;

    let object = Object::from_payload(kind, &content).map_err(|err| Error {
        message: format!("corrupt {}: {}", kind, err),
        kind: ErrorKind::InvalidValue,
        info: None,
    })?;

    let id = if args.is_present("w") {
        let repo = find_repo::from_path(&app.cwd)?;
        repo.objects().write(&object)?
    } else {
        object.id()
    };

    writeln!(app, "{}", id)?;

    Ok(())
}

fn kind_from_args(args: &ArgMatches) -> Result<Kind> {
    match args.value_of("t") {
        Some(name) => Kind::from_name(name).ok_or_else(|| {
            Error {
                message: "-t must be one of blob, commit, or tree".to_string(),
                kind: ErrorKind::InvalidValue,
                info: None,
            }
            .into()
        }),
        None => Ok(Kind::Blob),
    }
}

fn content_from_args(app: &mut App, args: &ArgMatches) -> Result<Vec<u8>> {
    let stdin = args.is_present("stdin");
    let file = args.value_of("file");

    match (stdin, file) {
        (false, Some(file)) => Ok(fs::read(app.cwd.join(file))?),
        (true, None) => {
            let mut content = Vec::new();
            app.stdin.read_to_end(&mut content)?;
            Ok(content)
        }
        _ => Err(Error {
            message: "content source must be either --stdin or a file path".to_string(),
            kind: ErrorKind::MissingRequiredArgument,
            info: None,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::cmds::test_support::init_repo;
    use crate::App;

    use sgit::object::Object;

    #[test]
    fn hash_file_without_writing() {
        let dir = init_repo();
        fs::write(dir.path().join("hello"), "Hello World").unwrap();

        let stdout = App::run_in_str(dir.path(), vec!["hash-object", "hello"]).unwrap();
        let id = Object::Blob(b"Hello World".to_vec()).id();
        assert_eq!(stdout, format!("{}\n", id));

        let objects = dir.path().join(".git/objects").join(id.dir_name());
        assert!(!objects.exists());
    }

    #[test]
    fn hash_stdin_and_write() {
        let dir = init_repo();

        let stdout = App::run_in_with_stdin(
            dir.path(),
            b"test content\n".to_vec(),
            vec!["hash-object", "-w", "--stdin"],
        )
        .unwrap();

        let id = Object::Blob(b"test content\n".to_vec()).id();
        assert_eq!(stdout, format!("{}\n", id).into_bytes());
        assert!(dir
            .path()
            .join(".git/objects")
            .join(id.dir_name())
            .join(id.file_name())
            .is_file());
    }

    #[test]
    fn hash_tree_checks_content() {
        let dir = init_repo();

        App::run_in_with_stdin(dir.path(), Vec::new(), vec!["hash-object", "-t", "tree", "--stdin"])
            .unwrap();

        let err = App::run_in_with_stdin(
            dir.path(),
            b"not a tree".to_vec(),
            vec!["hash-object", "-t", "tree", "--stdin"],
        )
        .unwrap_err();
        assert!(err.to_string().contains("corrupt tree"), "{}", err);
    }

    #[test]
    fn error_bad_type() {
        let dir = init_repo();
        let err = App::run_in(dir.path(), vec!["hash-object", "-t", "tag", "--stdin"]).unwrap_err();
        assert!(err.to_string().contains("-t must be one of"), "{}", err);
    }

    #[test]
    fn error_both_or_neither_source() {
        let dir = init_repo();

        let err = App::run_in(dir.path(), vec!["hash-object"]).unwrap_err();
        assert!(err.to_string().contains("--stdin or a file path"));

        let err = App::run_in(dir.path(), vec!["hash-object", "--stdin", "file"]).unwrap_err();
        assert!(err.to_string().contains("--stdin or a file path"));
    }
}
