//! Repository configuration, stored in `.git/config`.
//!
//! The file keeps git's section layout, and its values are written so that it
//! also parses as TOML:
//!
//! ```text
//! [core]
//! 	repositoryformatversion = 0
//! 	filemode = true
//! 	bare = false
//! 	logallrefupdates = true
//! [user]
//! 	name = "sgit"
//! 	email = "sgit@localhost"
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Result;

/// Overrides `user.name` when set.
pub const AUTHOR_NAME_ENV: &str = "SGIT_AUTHOR_NAME";

/// Overrides `user.email` when set.
pub const AUTHOR_EMAIL_ENV: &str = "SGIT_AUTHOR_EMAIL";

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub core: CoreConfig,
    pub user: UserConfig,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    pub repositoryformatversion: u32,
    pub filemode: bool,
    pub bare: bool,
    pub logallrefupdates: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            repositoryformatversion: 0,
            filemode: true,
            bare: false,
            logallrefupdates: true,
        }
    }
}

/// Identity recorded as author and committer of new commits.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        UserConfig {
            name: "sgit".to_string(),
            email: "sgit@localhost".to_string(),
        }
    }
}

impl Config {
    /// Read the config file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        match fs::read_to_string(path) {
            Ok(text) => Config::parse(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    /// Render in git's layout (tab-indented keys under `[section]` headers).
    pub fn to_git_text(&self) -> String {
        let c = &self.core;
        format!(
            "[core]\n\trepositoryformatversion = {}\n\tfilemode = {}\n\tbare = {}\n\tlogallrefupdates = {}\n[user]\n\tname = {}\n\temail = {}\n",
            c.repositoryformatversion,
            c.filemode,
            c.bare,
            c.logallrefupdates,
            toml::Value::String(self.user.name.clone()),
            toml::Value::String(self.user.email.clone()),
        )
    }

    /// The `(name, email)` to record on new commits.
    ///
    /// `SGIT_AUTHOR_NAME` and `SGIT_AUTHOR_EMAIL` take precedence over the file.
    pub fn author(&self) -> (String, String) {
        self.author_with(|key| env::var(key).ok())
    }

    fn author_with<F: Fn(&str) -> Option<String>>(&self, lookup: F) -> (String, String) {
        let pick = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        (
            pick(AUTHOR_NAME_ENV, &self.user.name),
            pick(AUTHOR_EMAIL_ENV, &self.user.email),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repo::Error;

    #[test]
    fn git_style_core_section_parses() {
        let text = "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n\tlogallrefupdates = true\n";
        let config = Config::parse(text).unwrap();
        assert_eq!(config.core, CoreConfig::default());
        assert_eq!(config.user, UserConfig::default());
    }

    #[test]
    fn round_trip() {
        let config = Config {
            core: CoreConfig {
                filemode: false,
                ..CoreConfig::default()
            },
            user: UserConfig {
                name: "Jane \"JD\" Doe".to_string(),
                email: "jane@example.com".to_string(),
            },
        };

        let text = config.to_git_text();
        assert!(text.starts_with("[core]\n\trepositoryformatversion = 0\n"));
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn defaults_for_missing_file_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(&dir.path().join("config")).unwrap(), Config::default());

        let config = Config::parse("[user]\nname = \"Only Name\"\n").unwrap();
        assert_eq!(config.user.name, "Only Name");
        assert_eq!(config.user.email, "sgit@localhost");
    }

    #[test]
    fn invalid() {
        match Config::parse("[core\nbare = ").unwrap_err() {
            Error::InvalidConfig(_) => (),
            err => panic!("Unexpected error {:?}", err),
        }
    }

    #[test]
    fn author_overrides() {
        let config = Config::default();

        assert_eq!(
            config.author_with(|_| None),
            ("sgit".to_string(), "sgit@localhost".to_string())
        );

        let (name, email) = config.author_with(|key| match key {
            AUTHOR_NAME_ENV => Some("Env Name".to_string()),
            AUTHOR_EMAIL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(name, "Env Name");
        assert_eq!(email, "sgit@localhost");
    }
}
