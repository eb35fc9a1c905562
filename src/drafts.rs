//! JSON Schema specification versions and per-keyword draft support sets.
use core::fmt;

/// JSON Schema specification versions.
#[non_exhaustive]
#[derive(Debug, Default, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord)]
pub enum Draft {
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    #[default]
    Draft202012,
    /// The "next" draft, as published at `json-schema.org/draft/next`
    DraftNext,
}

impl Draft {
    /// Map a meta-schema identifier to the draft it describes.
    ///
    /// Trailing empty fragments are ignored, so both
    /// `http://json-schema.org/draft-07/schema` and
    /// `http://json-schema.org/draft-07/schema#` are recognized.
    #[must_use]
    pub fn from_meta_schema(uri: &str) -> Option<Draft> {
        match uri.trim_end_matches('#') {
            "https://json-schema.org/draft/next/schema" => Some(Draft::DraftNext),
            "https://json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            "https://json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "http://json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "http://json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            _ => None,
        }
    }
    /// The canonical identifier of this draft's meta-schema.
    #[must_use]
    pub fn meta_schema_id(self) -> &'static str {
        match self {
            Draft::Draft6 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
            Draft::DraftNext => "https://json-schema.org/draft/next/schema",
        }
    }
    /// Under drafts 6 & 7 a `$ref` suppresses all sibling keywords.
    pub(crate) fn ref_suppresses_siblings(self) -> bool {
        matches!(self, Draft::Draft6 | Draft::Draft7)
    }
    /// Whether a plain-name `$id` fragment (`#name`) declares an anchor
    /// instead of a new resource.
    pub(crate) fn supports_anchor_in_id(self) -> bool {
        matches!(self, Draft::Draft6 | Draft::Draft7)
    }
    const fn bit(self) -> u8 {
        match self {
            Draft::Draft6 => 1,
            Draft::Draft7 => 1 << 1,
            Draft::Draft201909 => 1 << 2,
            Draft::Draft202012 => 1 << 3,
            Draft::DraftNext => 1 << 4,
        }
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Draft::Draft6 => "Draft 6",
            Draft::Draft7 => "Draft 7",
            Draft::Draft201909 => "Draft 2019-09",
            Draft::Draft202012 => "Draft 2020-12",
            Draft::DraftNext => "Draft Next",
        })
    }
}

const ALL_DRAFTS: [Draft; 5] = [
    Draft::Draft6,
    Draft::Draft7,
    Draft::Draft201909,
    Draft::Draft202012,
    Draft::DraftNext,
];

/// A compact set of drafts a keyword is declared for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct DraftSet(u8);

impl DraftSet {
    pub(crate) const ALL: DraftSet = DraftSet(0b11111);
    /// Drafts 2019-09 and newer.
    pub(crate) const MODERN: DraftSet = DraftSet(0b11100);
    /// Drafts 6 and 7 only.
    pub(crate) const LEGACY: DraftSet = DraftSet(0b00011);

    pub(crate) const fn single(draft: Draft) -> DraftSet {
        DraftSet(draft.bit())
    }
    pub(crate) const fn since(draft: Draft) -> DraftSet {
        // Set the draft's bit and everything above it.
        DraftSet(DraftSet::ALL.0 & !(draft.bit() - 1))
    }
    pub(crate) const fn until(draft: Draft) -> DraftSet {
        // Set the draft's bit and everything below it.
        DraftSet((draft.bit() << 1) - 1)
    }
    pub(crate) const fn contains(self, draft: Draft) -> bool {
        self.0 & draft.bit() != 0
    }
    pub(crate) const fn intersect(self, other: DraftSet) -> DraftSet {
        DraftSet(self.0 & other.0)
    }
    /// The newest draft in this set.
    pub(crate) fn newest(self) -> Option<Draft> {
        ALL_DRAFTS
            .into_iter()
            .rev()
            .find(|draft| self.contains(*draft))
    }
}

/// Intersect the support sets of all present keywords and pick the newest
/// member; an empty intersection yields [`Draft::DraftNext`].
pub(crate) fn newest_compatible(sets: impl Iterator<Item = DraftSet>) -> Draft {
    sets.fold(DraftSet::ALL, DraftSet::intersect)
        .newest()
        .unwrap_or(Draft::DraftNext)
}

#[cfg(test)]
mod tests {
    use super::{newest_compatible, Draft, DraftSet};
    use test_case::test_case;

    #[test_case("https://json-schema.org/draft/2020-12/schema", Some(Draft::Draft202012))]
    #[test_case("https://json-schema.org/draft/2019-09/schema", Some(Draft::Draft201909))]
    #[test_case("http://json-schema.org/draft-07/schema#", Some(Draft::Draft7))]
    #[test_case("http://json-schema.org/draft-06/schema#", Some(Draft::Draft6))]
    #[test_case("https://json-schema.org/draft/next/schema", Some(Draft::DraftNext))]
    #[test_case("https://example.com/custom", None)]
    fn meta_schema_detection(uri: &str, expected: Option<Draft>) {
        assert_eq!(Draft::from_meta_schema(uri), expected);
    }

    #[test]
    fn since_sets() {
        assert!(DraftSet::since(Draft::Draft201909).contains(Draft::DraftNext));
        assert!(!DraftSet::since(Draft::Draft201909).contains(Draft::Draft7));
        assert_eq!(DraftSet::since(Draft::Draft6), DraftSet::ALL);
    }

    #[test]
    fn newest_of_intersection() {
        let sets = [DraftSet::ALL, DraftSet::since(Draft::Draft6)];
        assert_eq!(newest_compatible(sets.into_iter()), Draft::DraftNext);
        let sets = [DraftSet::LEGACY, DraftSet::ALL];
        assert_eq!(newest_compatible(sets.into_iter()), Draft::Draft7);
        let sets = [DraftSet::LEGACY, DraftSet::MODERN];
        assert_eq!(newest_compatible(sets.into_iter()), Draft::DraftNext);
    }
}
