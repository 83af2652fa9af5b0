use crate::models::{DocumentType, SignatureSet};
use crate::utils::DocumentError;
use log::debug;
use regex::{Regex, RegexBuilder};

/// Weighted-vote document classifier: one vote per signature match.
pub struct DocumentClassifier {
    signatures: Vec<(DocumentType, Vec<Regex>)>,
}

impl DocumentClassifier {
    pub fn new(sets: &[SignatureSet]) -> Result<Self, DocumentError> {
        let mut signatures = Vec::with_capacity(sets.len());
        for set in sets {
            let compiled = set
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| DocumentError::InvalidPattern {
                            pattern: pattern.clone(),
                            reason: e.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            signatures.push((set.document_type, compiled));
        }
        Ok(DocumentClassifier { signatures })
    }

    /// Total match count per document type, in configuration order.
    pub fn scores(&self, text: &str) -> Vec<(DocumentType, usize)> {
        let text = text.to_lowercase();
        self.signatures
            .iter()
            .map(|(doc_type, patterns)| {
                let score = patterns.iter().map(|p| p.find_iter(&text).count()).sum();
                (*doc_type, score)
            })
            .collect()
    }

    /// The type with the strictly highest nonzero score. Ties and empty votes stay unclassified.
    pub fn classify(&self, text: &str) -> Option<DocumentType> {
        let scores = self.scores(text);
        debug!("Document type scores: {:?}", scores);

        let best = scores.iter().map(|(_, score)| *score).max().unwrap_or(0);
        if best == 0 {
            return None;
        }

        let mut leaders = scores.iter().filter(|(_, score)| *score == best);
        let winner = leaders.next().map(|(doc_type, _)| *doc_type);
        if leaders.next().is_some() {
            debug!("Tie at score {}, leaving document unclassified", best);
            return None;
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatternConfig;

    fn classifier() -> DocumentClassifier {
        DocumentClassifier::new(&PatternConfig::default().signatures).unwrap()
    }

    #[test]
    fn test_national_id_only() {
        let text = "REGISTRO GERAL\nSECRETARIA DE SEGURANÇA PÚBLICA\nINSTITUTO DE IDENTIFICAÇÃO";
        assert_eq!(classifier().classify(text), Some(DocumentType::Rg));
    }

    #[test]
    fn test_majority_wins_two_to_one() {
        // CNH: categoria + detran, passport: passport
        let text = "DETRAN\nCATEGORIA B\nPASSPORT";
        let classifier = classifier();
        let scores = classifier.scores(text);
        assert_eq!(
            scores,
            vec![
                (DocumentType::Rg, 0),
                (DocumentType::Cnh, 2),
                (DocumentType::Passport, 1)
            ]
        );
        assert_eq!(classifier.classify(text), Some(DocumentType::Cnh));
    }

    #[test]
    fn test_no_signatures_unclassified() {
        assert_eq!(classifier().classify("lorem ipsum 42"), None);
        assert_eq!(classifier().classify(""), None);
    }

    #[test]
    fn test_tie_unclassified() {
        assert_eq!(classifier().classify("PASSAPORTE\nCATEGORIA"), None);
    }

    #[test]
    fn test_case_insensitive_and_repeated_matches() {
        let text = "Passaporte / PASSAPORTE\nMinistério das Relações Exteriores\nDetran";
        assert_eq!(classifier().classify(text), Some(DocumentType::Passport));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let sets = vec![SignatureSet {
            document_type: DocumentType::Rg,
            patterns: vec!["(unclosed".to_string()],
        }];
        assert!(matches!(
            DocumentClassifier::new(&sets),
            Err(DocumentError::InvalidPattern { .. })
        ));
    }
}
