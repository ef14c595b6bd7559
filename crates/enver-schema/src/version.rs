//! Engine version parsing and ordering
//!
//! Engine versions look like `2022.3.60f1` or `6000.4.0b6`: dot-separated
//! numbers where the last segment carries a one-letter release channel and
//! a build number. Parsing is total so that any string can be ordered.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Pre-release channel encoded by the letter in the last version segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// `a` - alpha builds
    Alpha,
    /// `b` - beta builds
    Beta,
    /// `f` (or no letter) - final releases
    #[default]
    Final,
}

impl Channel {
    /// Map a channel letter to a channel. Letters other than `a` and `b`
    /// rank as final.
    pub fn from_letter(letter: char) -> Self {
        match letter.to_ascii_lowercase() {
            'a' => Self::Alpha,
            'b' => Self::Beta,
            _ => Self::Final,
        }
    }

    /// Rank used in comparisons: alpha=1, beta=2, final=3.
    pub fn rank(self) -> u64 {
        match self {
            Self::Alpha => 1,
            Self::Beta => 2,
            Self::Final => 3,
        }
    }

    /// The letter used in version strings.
    pub fn letter(self) -> char {
        match self {
            Self::Alpha => 'a',
            Self::Beta => 'b',
            Self::Final => 'f',
        }
    }
}

/// A parsed engine version.
///
/// Ordering compares `[numbers..., channel rank, build]` lexicographically.
/// When one key is a prefix of the other the shorter one sorts first.
///
/// # Example
///
/// ```
/// use enver_schema::VersionId;
///
/// let beta = VersionId::parse("6000.4.0b1");
/// let alpha = VersionId::parse("6000.4.0a5");
/// assert!(beta > alpha);
/// assert_eq!(beta.major(), 6000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VersionId {
    numbers: Vec<u64>,
    channel: Channel,
    build: u64,
}

impl VersionId {
    /// Parse a version string. Never fails: malformed numeric parts become `0`.
    pub fn parse(s: &str) -> Self {
        let segments: Vec<&str> = s.trim().split('.').collect();
        let (last, leading) = segments
            .split_last()
            .map_or(("", &[][..]), |(last, rest)| (*last, rest));

        let mut numbers: Vec<u64> = leading.iter().map(|seg| parse_number(seg)).collect();

        let (patch, channel, build) = match last.find(|c: char| c.is_ascii_alphabetic()) {
            Some(pos) => {
                let letter = last[pos..].chars().next().unwrap_or('f');
                let rest = &last[pos + letter.len_utf8()..];
                (
                    parse_number(&last[..pos]),
                    Channel::from_letter(letter),
                    parse_number(rest),
                )
            }
            None => (parse_number(last), Channel::Final, 0),
        };
        numbers.push(patch);

        Self {
            numbers,
            channel,
            build,
        }
    }

    /// First component (`6000` in `6000.0.1f1`).
    pub fn major(&self) -> u64 {
        self.numbers.first().copied().unwrap_or(0)
    }

    /// Second component, `0` when absent.
    pub fn minor(&self) -> u64 {
        self.numbers.get(1).copied().unwrap_or(0)
    }

    /// Third component, `0` when absent.
    pub fn patch(&self) -> u64 {
        self.numbers.get(2).copied().unwrap_or(0)
    }

    /// Release channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Build number after the channel letter.
    pub fn build(&self) -> u64 {
        self.build
    }

    fn key(&self) -> impl Iterator<Item = u64> + '_ {
        self.numbers
            .iter()
            .copied()
            .chain([self.channel.rank(), self.build])
    }
}

fn parse_number(s: &str) -> u64 {
    s.trim().parse().unwrap_or(0)
}

impl PartialEq for VersionId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionId {}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.numbers.iter().map(u64::to_string).collect();
        write!(
            f,
            "{}{}{}",
            numbers.join("."),
            self.channel.letter(),
            self.build
        )
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    VersionId::parse(a).cmp(&VersionId::parse(b))
}

/// The `major.minor` release line of a version string.
///
/// Returns the input unchanged when it has fewer than two segments.
///
/// ```
/// use enver_schema::version::major_minor;
///
/// assert_eq!(major_minor("2022.3.60f1"), "2022.3");
/// assert_eq!(major_minor("nodots"), "nodots");
/// ```
pub fn major_minor(version: &str) -> &str {
    let mut dots = version.match_indices('.');
    match (dots.next(), dots.next()) {
        (Some(_), Some((second, _))) => &version[..second],
        _ => version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let v = VersionId::parse("6000.4.0b6");
        assert_eq!(v.major(), 6000);
        assert_eq!(v.minor(), 4);
        assert_eq!(v.patch(), 0);
        assert_eq!(v.channel(), Channel::Beta);
        assert_eq!(v.build(), 6);
    }

    #[test]
    fn test_parse_without_letter_is_final() {
        let v = VersionId::parse("2022.3.0");
        assert_eq!(v.channel(), Channel::Final);
        assert_eq!(v.build(), 0);
    }

    #[test]
    fn test_parse_garbage_is_total() {
        let v = VersionId::parse("x.y.zz");
        assert_eq!(v.major(), 0);
        assert_eq!(v.minor(), 0);
        let empty = VersionId::parse("");
        assert_eq!(empty.major(), 0);
        assert_eq!(compare("", ""), Ordering::Equal);
    }

    #[test]
    fn test_channel_dominates_build() {
        assert_eq!(compare("6000.4.0f1", "6000.4.0b6"), Ordering::Greater);
        assert_eq!(compare("6000.4.0b6", "6000.4.0a5"), Ordering::Greater);
        assert_eq!(compare("6000.4.0b1", "6000.4.0a5"), Ordering::Greater);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare("2022.3.10f1", "2022.3.9f1"), Ordering::Greater);
        assert_eq!(compare("6000.0.0f1", "2023.2.20f1"), Ordering::Greater);
    }

    #[test]
    fn test_antisymmetric_and_reflexive() {
        let samples = [
            "2022.3.60f1",
            "6000.0.23f1",
            "6000.4.0b6",
            "6000.4.0a5",
            "2021.3",
            "garbage",
            "",
        ];
        for a in samples {
            assert_eq!(compare(a, a), Ordering::Equal);
            for b in samples {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_longer_key_wins_on_tie() {
        // "1.2" keys as [1, 2, 3, 0]; "1.2.3" as [1, 2, 3, 3, 0]
        assert_eq!(compare("1.2.3", "1.2"), Ordering::Greater);
    }

    #[test]
    fn test_major_minor() {
        assert_eq!(major_minor("2022.3.60f1"), "2022.3");
        assert_eq!(major_minor("6000.0"), "6000.0");
        assert_eq!(major_minor(""), "");
        assert_eq!(major_minor("nodots"), "nodots");
        assert_eq!(major_minor("2022."), "2022.");
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(VersionId::parse("6000.4.0b6").to_string(), "6000.4.0b6");
        assert_eq!(VersionId::parse("2022.3.1").to_string(), "2022.3.1f0");
    }
}
