use std::fmt;
use std::str::{self, FromStr};

use chrono::{FixedOffset, Local, TimeZone};

use super::parse_utils::split_once;

/// An `Attribution` combines a person's identity (name and e-mail address)
/// with the timestamp for a particular action.
///
/// Commits carry two of these (author and committer). In this repository
/// format both always share the configured identity and the time of the
/// commit.
///
/// The `timestamp` value is in seconds relative to the Unix epoch;
/// `tz_offset` is in minutes east of UTC.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribution {
    name: String,
    email: String,
    timestamp: i64,
    tz_offset: i16,
}

impl Attribution {
    /// Creates a new attribution.
    pub fn new(name: &str, email: &str, timestamp: i64, tz_offset: i16) -> Attribution {
        Attribution {
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            tz_offset,
        }
    }

    /// Creates an attribution stamped with the current local time and time zone.
    pub fn now(name: &str, email: &str) -> Attribution {
        let now = Local::now();
        let tz_offset = (now.offset().local_minus_utc() / 60) as i16;
        Attribution::new(name, email, now.timestamp(), tz_offset)
    }

    /// Parse the value of an `author` or `committer` line
    /// (`Name <email> 1234567890 +0100`).
    ///
    /// Returns `None` if the angle brackets are missing or the text is not UTF-8.
    /// A missing or unparseable timestamp or time zone reads as zero.
    pub fn parse(line: &[u8]) -> Option<Attribution> {
        let line = line.strip_suffix(b"\n").unwrap_or(line);

        if !line.contains(&b'<') {
            return None;
        }
        let (name, rest) = split_once(line, &b'<');

        if !rest.contains(&b'>') {
            return None;
        }
        let (email, rest) = split_once(rest, &b'>');

        let name = str::from_utf8(name).ok()?.trim_end().to_string();
        let email = str::from_utf8(email).ok()?.to_string();

        let rest = str::from_utf8(rest).unwrap_or("");
        let mut words = rest.split_whitespace();
        let timestamp = words.next().and_then(|t| i64::from_str(t).ok());
        let tz_offset = words.next().and_then(tz_from_str);

        let (timestamp, tz_offset) = match (timestamp, tz_offset) {
            (Some(t), Some(tz)) => (t, tz),
            _ => (0, 0),
        };

        Some(Attribution {
            name,
            email,
            timestamp,
            tz_offset,
        })
    }

    /// Returns the person's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the person's email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the timestamp.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the timezone offset (minutes relative to GMT).
    pub fn tz_offset(&self) -> i16 {
        self.tz_offset
    }

    /// Returns the timezone formatted in human readable offset from GMT.
    pub fn format_tz(&self) -> String {
        let sign = if self.tz_offset < 0 { "-" } else { "+" };

        let offset = self.tz_offset.abs();
        let hours = offset / 60;
        let min = offset % 60;

        format!("{}{:02}{:02}", sign, hours, min)
    }

    /// Returns the date in the style of `git log` (`Thu Apr 7 15:13:13 2005 -0700`),
    /// expressed in the attribution's own time zone.
    pub fn format_date(&self) -> String {
        let date = FixedOffset::east_opt(i32::from(self.tz_offset) * 60)
            .and_then(|tz| tz.timestamp_opt(self.timestamp, 0).single());

        match date {
            Some(date) => format!("{} {}", date.format("%a %b %-d %H:%M:%S %Y"), self.format_tz()),
            None => format!("{} {}", self.timestamp, self.format_tz()),
        }
    }
}

fn tz_from_str(s: &str) -> Option<i16> {
    let s = s.as_bytes();
    if s.len() != 5 {
        return None;
    }

    let sign: i16 = match s[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };

    let digits = str::from_utf8(&s[1..]).ok()?;
    let hhmm = i16::from_str(digits).ok()?;
    Some(sign * ((hhmm / 100) * 60 + hhmm % 100))
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp,
            self.format_tz()
        )
    }
}
