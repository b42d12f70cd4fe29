//! Reader for the `.netrc` network-credentials file
//!
//! Supports the subset of the format used for FTP logins:
//!
//! ```text
//! # comment
//! machine ftp.example.org
//!     login radar
//!     password "s3cret pass"
//! macdef init
//! cd /upload
//!
//! default login anonymous password guest@
//! ```
//!
//! `macdef` bodies are skipped up to the next blank line. A later `machine`
//! entry for the same host replaces an earlier one.

use crate::error::{CommonError, Result};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::str::Lines;
use tracing::debug;

/// Credentials for one host
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Authenticator {
    pub login: String,
    pub account: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("login", &self.login)
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parsed credentials file
#[derive(Debug, Clone, Default)]
pub struct Netrc {
    machines: HashMap<String, Authenticator>,
    default: Option<Authenticator>,
}

impl Netrc {
    /// Location of the user's credentials file (`~/.netrc`)
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".netrc"))
            .ok_or_else(|| CommonError::Config("Could not determine home directory to locate .netrc".to_string()))
    }

    /// Read and parse a credentials file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Reading credentials file");
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommonError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read {}: {}", path.display(), e),
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse credentials file content
    pub fn parse(input: &str) -> Result<Self> {
        let mut netrc = Self::default();
        let mut tokens = Tokens::new(input);
        // None marks the `default` entry
        let mut current: Option<(Option<String>, Authenticator)> = None;

        while let Some(token) = tokens.next_token() {
            match token.as_str() {
                "machine" => {
                    netrc.commit(current.take());
                    let host = tokens
                        .next_token()
                        .ok_or_else(|| CommonError::parse("missing host name after 'machine'"))?;
                    current = Some((Some(host), Authenticator::default()));
                },
                "default" => {
                    netrc.commit(current.take());
                    current = Some((None, Authenticator::default()));
                },
                "macdef" => {
                    netrc.commit(current.take());
                    tokens.skip_macro();
                },
                "login" | "user" | "account" | "password" => {
                    let (_, auth) = current.as_mut().ok_or_else(|| {
                        CommonError::parse(format!("'{}' appears outside a machine entry", token))
                    })?;
                    let value = tokens
                        .next_token()
                        .ok_or_else(|| CommonError::parse(format!("missing value after '{}'", token)))?;
                    match token.as_str() {
                        "account" => auth.account = Some(value),
                        "password" => auth.password = value,
                        _ => auth.login = value,
                    }
                },
                other => {
                    return Err(CommonError::parse(format!("unexpected token '{}'", other)));
                },
            }
        }
        netrc.commit(current);

        Ok(netrc)
    }

    /// Credentials for `host`, falling back to the `default` entry
    pub fn authenticators(&self, host: &str) -> Option<&Authenticator> {
        self.machines.get(host).or(self.default.as_ref())
    }

    fn commit(&mut self, entry: Option<(Option<String>, Authenticator)>) {
        match entry {
            Some((Some(host), auth)) => {
                self.machines.insert(host, auth);
            },
            Some((None, auth)) => self.default = Some(auth),
            None => {},
        }
    }
}

/// Line-aware tokenizer; `macdef` needs to skip whole lines
struct Tokens<'a> {
    lines: Lines<'a>,
    pending: VecDeque<String>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines(),
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Option<String> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let line = self.lines.next()?;
            self.pending = split_line(line);
        }
    }

    /// Drop the rest of the current line and the macro body after it
    fn skip_macro(&mut self) {
        self.pending.clear();
        for line in self.lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
        }
    }
}

fn split_line(line: &str) -> VecDeque<String> {
    let mut tokens = VecDeque::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => token.extend(chars.next()),
                    _ => token.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                if c == '\\' {
                    token.extend(chars.next());
                } else {
                    token.push(c);
                }
            }
        }
        tokens.push_back(token);
    }

    tokens
}
