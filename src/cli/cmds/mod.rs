use crate::{App, Result};

mod add;
mod branch;
mod cat_file;
mod checkout;
mod commit;
mod diff;
mod hash_object;
mod init;
mod log;
mod ls_files;
mod rm;
mod status;
mod tag;

pub(crate) fn add_subcommands<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
    app.subcommand(add::subcommand())
        .subcommand(branch::subcommand())
        .subcommand(cat_file::subcommand())
        .subcommand(checkout::subcommand())
        .subcommand(commit::subcommand())
        .subcommand(diff::subcommand())
        .subcommand(hash_object::subcommand())
        .subcommand(init::subcommand())
        .subcommand(log::subcommand())
        .subcommand(ls_files::subcommand())
        .subcommand(rm::subcommand())
        .subcommand(status::subcommand())
        .subcommand(tag::subcommand())
}

pub(crate) fn dispatch(app: &mut App) -> Result<()> {
    let matches = app.arg_matches.clone();
    // ^^ Ugh. Need an independent copy of matches so we can still pass
    // the App struct through to subcommand imps.

    match matches.subcommand() {
        ("add", Some(m)) => add::run(app, &m),
        ("branch", Some(m)) => branch::run(app, &m),
        ("cat-file", Some(m)) => cat_file::run(app, &m),
        ("checkout", Some(m)) => checkout::run(app, &m),
        ("commit", Some(m)) => commit::run(app, &m),
        ("diff", Some(m)) => diff::run(app, &m),
        ("hash-object", Some(m)) => hash_object::run(app, &m),
        ("init", Some(m)) => init::run(app, &m),
        ("log", Some(m)) => log::run(app, &m),
        ("ls-files", Some(m)) => ls_files::run(app, &m),
        ("rm", Some(m)) => rm::run(app, &m),
        ("status", Some(m)) => status::run(app, &m),
        ("tag", Some(m)) => tag::run(app, &m),
        _ => unreachable!(),
        // unreachable: Should have exited out with appropriate help or
        // error message if no subcommand was given.
    }
}
