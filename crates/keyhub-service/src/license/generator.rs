//! Random key code generation.

use rand::Rng;

use keyhub_entity::license::CodeFormat;
use keyhub_entity::license::code::{GENERATION_ALPHABET, SEGMENT_COUNT, SEGMENT_LENGTH};

/// Produces random codes in the configured format.
///
/// Uniqueness is not checked here; the store reports collisions and the
/// caller draws again.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    format: CodeFormat,
}

impl CodeGenerator {
    pub fn new(format: CodeFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &CodeFormat {
        &self.format
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let segments: Vec<String> = (0..SEGMENT_COUNT)
            .map(|_| {
                (0..SEGMENT_LENGTH)
                    .map(|_| {
                        let idx = rng.gen_range(0..GENERATION_ALPHABET.len());
                        GENERATION_ALPHABET[idx] as char
                    })
                    .collect()
            })
            .collect();
        self.format.compose(&segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_well_formed() {
        let generator = CodeGenerator::new(CodeFormat::new("SCO"));
        for _ in 0..200 {
            let code = generator.generate();
            assert!(generator.format().is_well_formed(&code), "{code}");
            assert!(code.starts_with("SCO-"));
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let generator = CodeGenerator::new(CodeFormat::new("SCO"));
        let codes: HashSet<String> = (0..100).map(|_| generator.generate()).collect();
        assert!(codes.len() > 95);
    }
}
