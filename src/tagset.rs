//! Chinese Treebank to Universal POS mapping
//!
//! The table is closed: every tag the corpus can contain is listed, and a
//! lookup outside it is an error rather than a fallback category.

use thiserror::Error;

/// A tag with no entry in the mapping table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("POS tag {0:?} has no universal mapping")]
pub struct UnmappedTag(pub String);

/// Every source tag paired with its universal category
pub const CTB_TO_UNIVERSAL: &[(&str, &str)] = &[
    ("VA", "ADJ"),
    ("VC", "AUX"),
    ("VE", "VERB"),
    ("VV", "VERB"),
    ("NR", "PROPN"),
    ("NT", "NOUN"),
    ("NN", "NOUN"),
    ("PN", "PRON"),
    ("LC", "ADP"),
    ("DT", "DET"),
    ("CD", "NUM"),
    ("OD", "ADJ"),
    ("M", "NOUN"),
    ("AD", "ADV"),
    ("P", "ADP"),
    ("CC", "CCONJ"),
    ("CS", "SCONJ"),
    ("DEC", "PART"),
    ("DEG", "PART"),
    ("DER", "PART"),
    ("DEV", "PART"),
    ("SP", "PART"),
    ("AS", "AUX"),
    ("ETC", "PART"),
    ("MSP", "PART"),
    ("IJ", "INTJ"),
    ("ON", "ADV"),
    ("PU", "PUNCT"),
    ("JJ", "ADJ"),
    ("FW", "X"),
    ("LB", "ADP"),
    ("SB", "AUX"),
    ("BA", "ADP"),
];

/// Map a Chinese Treebank tag to its universal category
pub fn to_universal(tag: &str) -> Result<&'static str, UnmappedTag> {
    CTB_TO_UNIVERSAL
        .iter()
        .find(|(source, _)| *source == tag)
        .map(|(_, upos)| *upos)
        .ok_or_else(|| UnmappedTag(tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(to_universal("NN"), Ok("NOUN"));
        assert_eq!(to_universal("M"), Ok("NOUN"));
        assert_eq!(to_universal("VV"), Ok("VERB"));
        assert_eq!(to_universal("VC"), Ok("AUX"));
        assert_eq!(to_universal("DEC"), Ok("PART"));
        assert_eq!(to_universal("PU"), Ok("PUNCT"));
        assert_eq!(to_universal("FW"), Ok("X"));
    }

    #[test]
    fn test_categories_are_universal_tags() {
        let mut categories: Vec<&str> = CTB_TO_UNIVERSAL.iter().map(|(_, u)| *u).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(CTB_TO_UNIVERSAL.len(), 33);
        assert!(categories.len() <= 17);
    }

    #[test]
    fn test_table_has_no_duplicates() {
        let mut tags: Vec<&str> = CTB_TO_UNIVERSAL.iter().map(|(t, _)| *t).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), CTB_TO_UNIVERSAL.len());
    }

    #[test]
    fn test_unmapped_tag() {
        assert_eq!(to_universal("XX"), Err(UnmappedTag("XX".to_string())));
        assert_eq!(to_universal("nn"), Err(UnmappedTag("nn".to_string())));
        assert_eq!(to_universal("_"), Err(UnmappedTag("_".to_string())));
        assert_eq!(to_universal("NOUN"), Err(UnmappedTag("NOUN".to_string())));
    }
}
