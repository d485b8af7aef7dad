//! Distribution version ordering.
//!
//! Versions follow the Debian `[epoch:]upstream[-revision]` layout. Each part
//! is compared as alternating runs of non-digits and digits: digit runs
//! numerically, non-digit runs character by character with letters before
//! other symbols and `~` before everything, even the end of the string. So
//! `1.10.0 > 1.2.0`, `1.0~rc1 < 1.0` and `1:0.9 > 2.0`.
//!
//! Strings the rules consider equal but which differ byte-wise (`1.0` vs
//! `1.00`) are ordered byte-wise, which keeps the order total: two versions
//! compare `Equal` only when they are the same string.

use std::cmp::Ordering;
use std::fmt;

/// An owned version string with distribution ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The epoch, `"0"` when absent.
    pub fn epoch(&self) -> &str {
        split(&self.0).epoch
    }

    pub fn upstream(&self) -> &str {
        split(&self.0).upstream
    }

    /// The packaging revision, empty when absent.
    pub fn revision(&self) -> &str {
        split(&self.0).revision
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.0, &other.0)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Compare two version strings. Never fails.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (va, vb) = (split(a), split(b));

    verrevcmp(va.epoch, vb.epoch)
        .then_with(|| verrevcmp(va.upstream, vb.upstream))
        .then_with(|| verrevcmp(va.revision, vb.revision))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

struct Parts<'a> {
    epoch: &'a str,
    upstream: &'a str,
    revision: &'a str,
}

fn split(raw: &str) -> Parts<'_> {
    let (epoch, rest) = match raw.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            (epoch, rest)
        }
        _ => ("0", raw),
    };
    let (upstream, revision) = rest.rsplit_once('-').unwrap_or((rest, ""));

    Parts {
        epoch,
        upstream,
        revision,
    }
}

/// Weight of a character inside a non-digit run. End of string and digits
/// weigh 0.
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn verrevcmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);
    let is_digit = |s: &[u8], k: usize| s.get(k).is_some_and(u8::is_ascii_digit);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let (ac, bc) = (order(a.get(i).copied()), order(b.get(j).copied()));
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while is_digit(a, i) && is_digit(b, j) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if is_digit(a, i) {
            return Ordering::Greater;
        }
        if is_digit(b, j) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}
