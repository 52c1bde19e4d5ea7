//! Key code format: `PREFIX-XXXX-XXXX-XXXX`.
//!
//! The format is an external contract shared with installed scanner
//! clients. Segments are uppercase ASCII alphanumerics of fixed length.

/// Number of random segments after the prefix.
pub const SEGMENT_COUNT: usize = 3;
/// Characters per segment.
pub const SEGMENT_LENGTH: usize = 4;
/// Characters used when generating codes. Omits `0`, `1`, `I` and `O`,
/// which are easily misread.
pub const GENERATION_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Code format bound to a product prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFormat {
    prefix: String,
}

impl CodeFormat {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_ascii_uppercase(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Normalize raw user input and check it against the format.
    ///
    /// Surrounding whitespace is dropped and letters are upper-cased.
    /// Returns the canonical code, or `None` when the input is malformed.
    pub fn parse(&self, raw: &str) -> Option<String> {
        let candidate = raw.trim().to_ascii_uppercase();
        self.is_well_formed(&candidate).then_some(candidate)
    }

    /// Strict check of an already canonical code.
    pub fn is_well_formed(&self, code: &str) -> bool {
        let mut parts = code.split('-');
        if parts.next() != Some(self.prefix.as_str()) {
            return false;
        }
        let segments: Vec<&str> = parts.collect();
        segments.len() == SEGMENT_COUNT
            && segments.iter().all(|segment| {
                segment.len() == SEGMENT_LENGTH
                    && segment
                        .bytes()
                        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            })
    }

    /// Join segments into a full code under this prefix.
    pub fn compose(&self, segments: &[String]) -> String {
        let mut code = self.prefix.clone();
        for segment in segments {
            code.push('-');
            code.push_str(segment);
        }
        code
    }
}
