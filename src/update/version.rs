//! Version ordering across npm and Maven/NuGet version grammars
//!
//! Versions are reduced to `major.minor.patch[.build]` plus an optional
//! prerelease token. Maven `.RELEASE`/`.FINAL` suffixes count as releases.
//! Prerelease tokens rank as:
//! `SNAPSHOT` < `ALPHA`/`A<n>` < `BETA`/`B<n>` < `M<n>` < `RC<n>` < anything else.

use crate::domain::UpdateType;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static RELEASE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:RELEASE|FINAL)$").unwrap());

static KNOWN_PRERELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[._\-]((?:M\d+|RC[._\-]?\d*|SNAPSHOT|alpha[._\-]?\d*|a\d+|beta[._\-]?\d*|b\d+))$")
        .unwrap()
});

// npm-style prerelease such as `-canary.3` or `-next.0`
static GENERIC_PRERELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([A-Za-z][0-9A-Za-z.\-]*)$").unwrap());

static FIRST_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Numeric components and prerelease token of a version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionComponents {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: Option<u64>,
    /// Uppercased prerelease token
    pub prerelease: Option<String>,
}

impl VersionComponents {
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

/// Splits a version string into comparable components
pub fn parse_version_components(version: &str) -> VersionComponents {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    // build metadata never affects ordering
    let trimmed = trimmed.split('+').next().unwrap_or(trimmed);

    let mut rest = RELEASE_SUFFIX_RE.replace(trimmed, "").into_owned();
    let mut prerelease = None;

    if let Some(caps) = KNOWN_PRERELEASE_RE.captures(&rest) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
        prerelease = caps.get(1).map(|m| m.as_str().to_ascii_uppercase());
        rest.truncate(whole);
    } else if let Some(caps) = GENERIC_PRERELEASE_RE.captures(&rest) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
        prerelease = caps.get(1).map(|m| m.as_str().to_ascii_uppercase());
        rest.truncate(whole);
    }

    let mut parts = rest
        .split(['.', '-'])
        .map(|segment| segment.parse::<u64>().unwrap_or(0));

    VersionComponents {
        major: parts.next().unwrap_or(0),
        minor: parts.next().unwrap_or(0),
        patch: parts.next().unwrap_or(0),
        build: parts.next(),
        prerelease,
    }
}

fn prerelease_rank(token: &str) -> u64 {
    let number = first_number(token).unwrap_or(0);
    if token.starts_with("SNAPSHOT") {
        0
    } else if token.starts_with("ALPHA") || is_letter_number(token, 'A') {
        1
    } else if token.starts_with("BETA") || is_letter_number(token, 'B') {
        2
    } else if is_letter_number(token, 'M') {
        3 + number
    } else if token.starts_with("RC") {
        100 + number
    } else {
        200
    }
}

fn is_letter_number(token: &str, letter: char) -> bool {
    token
        .strip_prefix(letter)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn first_number(token: &str) -> Option<u64> {
    FIRST_NUMBER_RE
        .find(token)
        .and_then(|m| m.as_str().parse().ok())
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    prerelease_rank(a)
        .cmp(&prerelease_rank(b))
        .then_with(|| first_number(a).unwrap_or(0).cmp(&first_number(b).unwrap_or(0)))
}

fn compare_components(a: &VersionComponents, b: &VersionComponents) -> Ordering {
    let numeric = a
        .major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch));
    if numeric != Ordering::Equal {
        return numeric;
    }

    // Build numbers only order versions when both sides carry one
    if let (Some(build_a), Some(build_b)) = (a.build, b.build) {
        if build_a != build_b {
            return build_a.cmp(&build_b);
        }
    }

    match (&a.prerelease, &b.prerelease) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(pa), Some(pb)) => compare_prerelease(pa, pb),
    }
}

/// Compares two version strings, returning -1, 0 or 1
pub fn compare_versions(a: &str, b: &str) -> i32 {
    match version_ordering(a, b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// [`compare_versions`] as an [`Ordering`], for use with `sort_by`/`max_by`
pub fn version_ordering(a: &str, b: &str) -> Ordering {
    compare_components(&parse_version_components(a), &parse_version_components(b))
}

/// Highest stable version, or the highest prerelease when nothing stable exists
pub fn select_latest_version<I, S>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let (stable, prerelease): (Vec<String>, Vec<String>) = versions
        .into_iter()
        .map(Into::into)
        .partition(|v| !parse_version_components(v).is_prerelease());
    let pool = if stable.is_empty() { prerelease } else { stable };
    pool.into_iter().max_by(|a, b| version_ordering(a, b))
}

/// Classifies the update from `current` to `latest`, or `None` when `latest`
/// is not strictly newer
pub fn get_update_type(current: &str, latest: &str) -> Option<UpdateType> {
    let current = parse_version_components(current);
    let latest = parse_version_components(latest);

    if compare_components(&latest, &current) != Ordering::Greater {
        return None;
    }

    if latest.major > current.major {
        return Some(UpdateType::Major);
    }
    if latest.major == current.major && latest.minor > current.minor {
        return Some(UpdateType::Minor);
    }
    if latest.major == current.major && latest.minor == current.minor {
        if latest.patch > current.patch {
            return Some(UpdateType::Patch);
        }
        if latest.patch == current.patch {
            if let (Some(lb), Some(cb)) = (latest.build, current.build) {
                if lb > cb {
                    return Some(UpdateType::Patch);
                }
            }
        }
    }

    if current.is_prerelease() || latest.is_prerelease() {
        return Some(UpdateType::Prerelease);
    }

    None
}
