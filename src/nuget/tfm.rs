//! Target framework moniker normalization and compatibility closure
//!
//! Catalog monikers such as `.NETFramework4.6.1` or `.NETCoreApp5.0` are
//! folded into NuGet's short folder names (`net461`, `net5.0`). The closure
//! of a declared framework comes from a fixed table following the published
//! .NET Standard support matrix.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

static NETFRAMEWORK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^netframework(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap());

static NETSTANDARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^netstandard(\d+)\.(\d+)$").unwrap());

static NETCORE_FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(netcoreapp|netplatform)(\d+)\.(\d+)$").unwrap());

static MONO_FAMILY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(monoandroid|monotouch|monomac|xamarinios|xamarinmac|xamarintvos|xamarinwatchos)(\d+(?:\.\d+)*)$",
    )
    .unwrap()
});

static NETFX_SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^net(\d)(\d)(\d)?$").unwrap());

static MONO_SHORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(monoandroid|monotouch|monomac|xamarinios|xamarinmac|xamarintvos|xamarinwatchos)(\d+)$")
        .unwrap()
});

static NET_UNIFIED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^net(\d+)\.(\d+)$").unwrap());

const NET_FRAMEWORK: &[&str] = &[
    "net45", "net451", "net452", "net46", "net461", "net462", "net47", "net471", "net472",
    "net48", "net481",
];

const NET_CORE_APP: &[&str] = &[
    "netcoreapp1.0",
    "netcoreapp1.1",
    "netcoreapp2.0",
    "netcoreapp2.1",
    "netcoreapp2.2",
    "netcoreapp3.0",
    "netcoreapp3.1",
];

const NET_UNIFIED: &[&str] = &["net5.0", "net6.0", "net7.0", "net8.0", "net9.0", "net10.0"];

const NET_STANDARD: &[&str] = &[
    "netstandard1.0",
    "netstandard1.1",
    "netstandard1.2",
    "netstandard1.3",
    "netstandard1.4",
    "netstandard1.5",
    "netstandard1.6",
    "netstandard2.0",
    "netstandard2.1",
];

const MONO_XAMARIN: &[&str] = &[
    "monoandroid10",
    "monotouch10",
    "xamarinios10",
    "xamarinmac20",
    "xamarintvos10",
    "xamarinwatchos10",
];

const UAP: &str = "uap10.0";

const PLATFORM_SUFFIXES: &[&str] = &[
    "windows",
    "android",
    "ios",
    "maccatalyst",
    "macos",
    "tvos",
    "browser",
];

/// .NET Standard version -> (first .NET Framework, first .NET Core, UWP support)
const NET_STANDARD_MATRIX: &[(&str, Option<&str>, &str, bool)] = &[
    ("netstandard1.0", Some("net45"), "netcoreapp1.0", true),
    ("netstandard1.1", Some("net45"), "netcoreapp1.0", true),
    ("netstandard1.2", Some("net451"), "netcoreapp1.0", true),
    ("netstandard1.3", Some("net46"), "netcoreapp1.0", true),
    ("netstandard1.4", Some("net461"), "netcoreapp1.0", true),
    ("netstandard1.5", Some("net461"), "netcoreapp1.0", true),
    ("netstandard1.6", Some("net461"), "netcoreapp1.0", true),
    ("netstandard2.0", Some("net461"), "netcoreapp2.0", false),
    ("netstandard2.1", None, "netcoreapp3.0", false),
];

fn from_item<'a>(list: &'a [&'a str], first: &str) -> &'a [&'a str] {
    list.iter()
        .position(|item| *item == first)
        .map(|idx| &list[idx..])
        .unwrap_or(&[])
}

fn after_item<'a>(list: &'a [&'a str], item: &str) -> &'a [&'a str] {
    list.iter()
        .position(|x| *x == item)
        .map(|idx| &list[idx + 1..])
        .unwrap_or(&[])
}

/// Declared framework -> frameworks that can consume it
static DERIVED_MAP: LazyLock<HashMap<&'static str, Vec<&'static str>>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();

    for (standard, netfx, netcore, uap) in NET_STANDARD_MATRIX {
        let mut derived: Vec<&'static str> = Vec::new();
        if let Some(netfx) = netfx {
            derived.extend(from_item(NET_FRAMEWORK, netfx));
        }
        derived.extend(from_item(NET_CORE_APP, netcore));
        derived.extend(NET_UNIFIED);
        derived.extend(after_item(NET_STANDARD, standard));
        if *uap {
            derived.push(UAP);
        }
        derived.extend(MONO_XAMARIN);
        map.insert(*standard, derived);
    }

    for family in [NET_FRAMEWORK, NET_UNIFIED] {
        for tfm in family {
            map.insert(*tfm, after_item(family, tfm).to_vec());
        }
    }
    for tfm in NET_CORE_APP {
        let mut derived = after_item(NET_CORE_APP, tfm).to_vec();
        derived.extend(NET_UNIFIED);
        map.insert(*tfm, derived);
    }

    map
});

/// How a framework ended up in the compatibility set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TfmStatus {
    /// Declared by the package
    Compatible,
    /// Implied by a declared framework
    Computed,
}

impl fmt::Display for TfmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TfmStatus::Compatible => f.write_str("compatible"),
            TfmStatus::Computed => f.write_str("computed"),
        }
    }
}

/// Normalizes a moniker to its short lookup form.
///
/// `.NETFramework4.6.1` -> `net461`, `.NETStandard1.3` -> `netstandard1.3`,
/// `.NETCoreApp5.0` -> `net5.0`, `Xamarin.iOS1.0` -> `xamarinios10`.
/// Short forms pass through unchanged.
pub fn normalize_tfm_for_lookup(tfm: &str) -> String {
    let lowered = tfm.trim().to_ascii_lowercase();
    let lowered = lowered.strip_prefix('.').unwrap_or(&lowered);
    let value = lowered
        .replace(",version=v", "")
        .replacen("xamarin.", "xamarin", 1);

    if let Some(caps) = NETFRAMEWORK_RE.captures(&value) {
        let major = &caps[1];
        let minor = caps.get(2).map_or("0", |m| m.as_str());
        let build = caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|b| b.parse::<u32>().unwrap_or(0) != 0)
            .unwrap_or("");
        return format!("net{}{}{}", major, minor, build);
    }

    if let Some(caps) = NETSTANDARD_RE.captures(&value) {
        return format!("netstandard{}.{}", &caps[1], &caps[2]);
    }

    if let Some(caps) = NETCORE_FAMILY_RE.captures(&value) {
        let major: u32 = caps[2].parse().unwrap_or(0);
        return if major >= 5 {
            format!("net{}.{}", major, &caps[3])
        } else {
            format!("{}{}.{}", &caps[1], major, &caps[3])
        };
    }

    if let Some(caps) = MONO_FAMILY_RE.captures(&value) {
        return format!("{}{}", &caps[1], caps[2].replace('.', ""));
    }

    value
}

fn mono_display_family(family: &str) -> &str {
    match family {
        "monoandroid" => "MonoAndroid",
        "monotouch" => "MonoTouch",
        "monomac" => "MonoMac",
        "xamarinios" => "Xamarin.iOS",
        "xamarinmac" => "Xamarin.Mac",
        "xamarintvos" => "Xamarin.TVOS",
        "xamarinwatchos" => "Xamarin.WatchOS",
        other => other,
    }
}

/// Display name for .NET Framework and Mono/Xamarin short forms; other
/// monikers are already in display form and come back unchanged
pub fn normalized_tfm_to_display(tfm: &str) -> String {
    if let Some(caps) = NETFX_SHORT_RE.captures(tfm) {
        let mut display = format!(".NETFramework {}.{}", &caps[1], &caps[2]);
        if let Some(build) = caps.get(3) {
            display.push('.');
            display.push_str(build.as_str());
        }
        return display;
    }

    if let Some(caps) = MONO_SHORT_RE.captures(tfm) {
        let digits: Vec<String> = caps[2].chars().map(|c| c.to_string()).collect();
        return format!("{} {}", mono_display_family(&caps[1]), digits.join("."));
    }

    tfm.to_string()
}

/// Frameworks that can consume a package declaring `declared`.
///
/// Declared frameworks are `Compatible`; everything implied by them is
/// `Computed`. A `Compatible` entry is never downgraded.
pub fn compute_all_tfms_with_status<S: AsRef<str>>(declared: &[S]) -> BTreeMap<String, TfmStatus> {
    let normalized: Vec<String> = declared
        .iter()
        .map(|tfm| normalize_tfm_for_lookup(tfm.as_ref()))
        .filter(|tfm| !tfm.is_empty())
        .collect();

    let mut statuses: BTreeMap<String, TfmStatus> = normalized
        .iter()
        .map(|tfm| (tfm.clone(), TfmStatus::Compatible))
        .collect();

    for tfm in &normalized {
        if let Some(derived) = DERIVED_MAP.get(tfm.as_str()) {
            for implied in derived {
                statuses
                    .entry((*implied).to_string())
                    .or_insert(TfmStatus::Computed);
            }
        }

        let is_unified = NET_UNIFIED_RE
            .captures(tfm)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .is_some_and(|major| major >= 5);
        if is_unified {
            for suffix in PLATFORM_SUFFIXES {
                statuses
                    .entry(format!("{}-{}", tfm, suffix))
                    .or_insert(TfmStatus::Computed);
            }
        }
    }

    statuses
}
