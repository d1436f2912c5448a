use std::cmp::Ordering;
use std::fmt;

/// A package version specifier: Epoch, Version, and Release.
///
/// Epoch overrides all other fields and exists mainly as an escape hatch for
/// cases where a packaging mistake or a versioning scheme change would
/// otherwise make a newer package sort as older.
///
/// Tilde (`~`) marks a pre-release and sorts lower than the same string
/// without it, e.g. `0.5.0~rc1` < `0.5.0`. Caret (`^`) marks a post-release
/// snapshot and sorts higher, e.g. `0.5.0^git1` > `0.5.0`.
#[derive(Clone, Debug, Default, Eq, Hash)]
pub struct Evr {
    pub epoch: String,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new<T: Into<String>>(epoch: T, version: T, release: T) -> Evr {
        Evr {
            epoch: epoch.into(),
            version: version.into(),
            release: release.into(),
        }
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn parse_values(evr: &str) -> (&str, &str, &str) {
        let (epoch, vr) = evr.split_once(':').unwrap_or(evr.split_at(0));
        let (version, release) = vr.split_once('-').unwrap_or((vr, ""));
        (epoch, version, release)
    }

    pub fn parse(evr: &str) -> Self {
        Evr::parse_values(evr).into()
    }
}

impl From<(&str, &str, &str)> for Evr {
    fn from(val: (&str, &str, &str)) -> Self {
        Evr::new(val.0, val.1, val.2)
    }
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        ((self.epoch == other.epoch)
            || (self.epoch.is_empty() && other.epoch == "0")
            || (self.epoch == "0" && other.epoch.is_empty()))
            && self.version == other.version
            && self.release == other.release
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.epoch.is_empty() {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}-{}", self.version, self.release)
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        let epoch_1 = if self.epoch.is_empty() { "0" } else { &self.epoch };
        let epoch_2 = if other.epoch.is_empty() { "0" } else { &other.epoch };

        let epoch_cmp = compare_version_string(epoch_1, epoch_2);
        if epoch_cmp != Ordering::Equal {
            return epoch_cmp;
        }

        let version_cmp = compare_version_string(&self.version, &other.version);
        if version_cmp != Ordering::Equal {
            return version_cmp;
        }

        compare_version_string(&self.release, &other.release)
    }
}

/// One unit of a version/release string as the comparator sees it: a
/// pre-release marker, a post-release marker, or a contiguous run of digits
/// or letters. Runs of anything else (punctuation, whitespace, non-ASCII
/// letters) act only as separators between segments and never appear here.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Tilde,
    Caret,
    Digits(&'a str),
    Alpha(&'a str),
}

fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric() && c != '~' && c != '^'
}

/// Walks a version/release string one [`Segment`] at a time, skipping
/// separator runs between segments.
struct SegmentCursor<'a> {
    rest: &'a str,
}

impl<'a> SegmentCursor<'a> {
    fn new(s: &'a str) -> Self {
        SegmentCursor { rest: s }
    }

    /// Discards any leading separator run without consuming a segment.
    fn skip_separators(&mut self) {
        self.rest = self.rest.trim_start_matches(is_separator);
    }

    /// The string from the current position onward, after separators have
    /// been skipped.
    fn remainder(&self) -> &'a str {
        self.rest
    }

    /// Consumes and returns the next segment. Callers must call
    /// `skip_separators` first; returns `None` only when the remainder is
    /// empty.
    fn take(&mut self) -> Option<Segment<'a>> {
        let mut chars = self.rest.chars();
        match chars.next()? {
            '~' => {
                self.rest = &self.rest[1..];
                Some(Segment::Tilde)
            }
            '^' => {
                self.rest = &self.rest[1..];
                Some(Segment::Caret)
            }
            c if c.is_ascii_digit() => {
                let end = self.rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(self.rest.len());
                let (digits, rest) = self.rest.split_at(end);
                self.rest = rest;
                Some(Segment::Digits(digits))
            }
            _ => {
                let end = self
                    .rest
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(self.rest.len());
                let (alpha, rest) = self.rest.split_at(end);
                self.rest = rest;
                Some(Segment::Alpha(alpha))
            }
        }
    }
}

/// Segment-by-segment comparison of two version or release strings, per the
/// reference `rpmvercmp` algorithm: digit runs outrank letter runs, runs of
/// the same kind compare numerically (digits) or lexically (letters), `~`
/// always sorts lower, and `^` sorts higher only against a fully-consumed
/// counterpart.
pub fn compare_version_string(version1: &str, version2: &str) -> Ordering {
    if version1 == version2 {
        return Ordering::Equal;
    }

    let mut left = SegmentCursor::new(version1);
    let mut right = SegmentCursor::new(version2);

    loop {
        left.skip_separators();
        right.skip_separators();

        match (left.remainder().starts_with('~'), right.remainder().starts_with('~')) {
            (true, true) => {
                left.take();
                right.take();
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        match (left.remainder().starts_with('^'), right.remainder().starts_with('^')) {
            (true, true) => {
                left.take();
                right.take();
                continue;
            }
            (true, false) => {
                return if right.remainder().is_empty() { Ordering::Greater } else { Ordering::Less };
            }
            (false, true) => {
                return if left.remainder().is_empty() { Ordering::Less } else { Ordering::Greater };
            }
            (false, false) => {}
        }

        if left.remainder().is_empty() || right.remainder().is_empty() {
            return left.remainder().len().cmp(&right.remainder().len());
        }

        match (left.take().unwrap(), right.take().unwrap()) {
            (Segment::Digits(_), Segment::Alpha(_)) => return Ordering::Greater,
            (Segment::Alpha(_), Segment::Digits(_)) => return Ordering::Less,
            (Segment::Digits(a), Segment::Digits(b)) => {
                let by_significant_length =
                    a.trim_start_matches('0').len().cmp(&b.trim_start_matches('0').len());
                if by_significant_length != Ordering::Equal {
                    return by_significant_length;
                }
                let by_value = a.cmp(b);
                if by_value != Ordering::Equal {
                    return by_value;
                }
            }
            (Segment::Alpha(a), Segment::Alpha(b)) => {
                let by_value = a.cmp(b);
                if by_value != Ordering::Equal {
                    return by_value;
                }
            }
            (Segment::Tilde, _) | (_, Segment::Tilde) | (Segment::Caret, _) | (_, Segment::Caret) => {
                unreachable!("tilde and caret are handled before segment extraction")
            }
        }
    }
}

/// Compares two packages by EVR as formatted strings (`[epoch:]version[-release]`).
pub fn rpmvercmp(evr1: &str, evr2: &str) -> Ordering {
    Evr::parse(evr1).cmp(&Evr::parse(evr2))
}
