use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SyncError};

/// Maximum accepted path length
const MAX_PATH_LENGTH: usize = 4096;

/// `C:\Pictures\2024`; a bare drive root has no segment and is rejected
const DRIVE_PATH_PATTERN: &str =
    r#"^[A-Za-z]:[\\/]+[^\\/<>:"|?*\x00-\x1F][^<>:"|?*\x00-\x1F]*$"#;

/// `\\server\share\folder`
const UNC_PATH_PATTERN: &str =
    r#"^\\\\[^\\/<>:"|?*\x00-\x1F]+[\\/]+[^\\/<>:"|?*\x00-\x1F]+([\\/][^<>:"|?*\x00-\x1F]*)?$"#;

/// `/home/user/Pictures`
const POSIX_PATH_PATTERN: &str = r"^/[^\x00]*$";

fn drive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DRIVE_PATH_PATTERN).expect("drive path pattern is valid"))
}

fn unc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(UNC_PATH_PATTERN).expect("UNC path pattern is valid"))
}

fn posix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(POSIX_PATH_PATTERN).expect("POSIX path pattern is valid"))
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Decides which raw directory strings are acceptable sync endpoints.
///
/// The default validator accepts drive-letter paths and UNC paths only.
/// POSIX absolute paths can be enabled for Unix hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathValidator {
    accept_posix: bool,
}

impl PathValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posix_paths(mut self, accept: bool) -> Self {
        self.accept_posix = accept;
        self
    }

    pub fn accepts_posix_paths(&self) -> bool {
        self.accept_posix
    }

    /// Returns `Ok(false)` for malformed paths.
    ///
    /// A missing path is a caller error and fails with
    /// [`SyncError::NullArgument`] instead.
    pub fn validate(&self, path: Option<&str>) -> Result<bool> {
        let path = path.ok_or(SyncError::NullArgument("path"))?;

        if path.trim().is_empty() || path.len() > MAX_PATH_LENGTH {
            return Ok(false);
        }

        Ok(drive_regex().is_match(path)
            || unc_regex().is_match(path)
            || (self.accept_posix && posix_regex().is_match(path)))
    }

    pub fn normalize(&self, path: &str) -> String {
        normalize_path(path)
    }
}

/// Validate with the default (drive and UNC) rules
pub fn validate_path(path: Option<&str>) -> Result<bool> {
    PathValidator::default().validate(path)
}

/// Collapse every run of consecutive separators into its first separator.
///
/// The leading `\\` of a UNC path is a prefix and survives. No case folding,
/// no `..` resolution and no filesystem access happen here.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut rest = path;

    if let Some(tail) = path.strip_prefix(r"\\") {
        normalized.push_str(r"\\");
        rest = tail.trim_start_matches(is_separator);
    }

    let mut previous_was_separator = false;
    for c in rest.chars() {
        if is_separator(c) {
            if !previous_was_separator {
                normalized.push(c);
            }
            previous_was_separator = true;
        } else {
            normalized.push(c);
            previous_was_separator = false;
        }
    }

    normalized
}
