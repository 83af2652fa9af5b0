// Field extraction: free-text regex scans reconciled with forms key-value output.
use crate::models::{
    ExtractedFields, FieldCandidate, FieldName, FieldPatterns, FieldSource, StructuredKeys,
};
use crate::processing::FieldCorrection;
use crate::utils::DocumentError;
use crate::validation::TaxIdValidator;
use log::{debug, info};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

const MIN_NAME_LEN: usize = 6;
const MIN_ID_DIGITS: usize = 4;
// "nome do pai", "nome da mãe": a name key qualified this way belongs to someone else.
const PARENT_QUALIFIERS: [&str; 4] = ["do", "da", "dos", "das"];

pub struct FieldExtractor {
    validator: TaxIdValidator,
    name_patterns: Vec<Regex>,
    tax_id_labeled: Vec<Regex>,
    tax_id_unlabeled: Vec<Regex>,
    welfare_patterns: Vec<Regex>,
    id_number_patterns: Vec<Regex>,
    tax_id_value: Regex,
    tax_id_tokens: Vec<String>,
    welfare_tokens: Vec<String>,
    context_window: usize,
    keys: StructuredKeys,
}

/// Outcome of the context check around an unlabeled tax id hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextVerdict {
    Favored,
    Neutral,
    Rejected,
}

impl FieldExtractor {
    pub fn new(patterns: &FieldPatterns, validator: TaxIdValidator) -> Result<Self, DocumentError> {
        let keys = StructuredKeys {
            name: normalize_spellings(&patterns.structured_keys.name),
            tax_id: normalize_spellings(&patterns.structured_keys.tax_id),
            id_number: normalize_spellings(&patterns.structured_keys.id_number),
            welfare: normalize_spellings(&patterns.structured_keys.welfare),
        };

        Ok(FieldExtractor {
            validator,
            name_patterns: compile(&patterns.name)?,
            tax_id_labeled: compile(&patterns.tax_id_labeled)?,
            tax_id_unlabeled: compile(&patterns.tax_id_unlabeled)?,
            welfare_patterns: compile(&patterns.welfare)?,
            id_number_patterns: compile(&patterns.id_number)?,
            tax_id_value: compile_one(r"\d{3}[. ]?\d{3}[. ]?\d{3}[-. ]?\d{2}")?,
            tax_id_tokens: lowercase_all(&patterns.tax_id_context_tokens),
            welfare_tokens: lowercase_all(&patterns.welfare_context_tokens),
            context_window: patterns.context_window,
            keys,
        })
    }

    pub fn validator(&self) -> &TaxIdValidator {
        &self.validator
    }

    /// Reconciles free text and structured fields into one value per field.
    /// Structured hits win over free text once they pass validation.
    pub fn extract(&self, text: &str, structured: &BTreeMap<String, String>) -> ExtractedFields {
        let mut rejected = Vec::new();
        let mut accepted = Vec::new();

        let welfare = self.welfare_numbers(text, structured);
        if !welfare.is_empty() {
            debug!("Excluding {} welfare number(s) from tax id candidates", welfare.len());
        }

        let tax_digits = self
            .structured_tax_id(structured, &welfare, &mut rejected)
            .or_else(|| self.text_tax_id(text, &welfare, &mut rejected))
            .map(|(digits, winner)| {
                accepted.push(winner);
                digits
            });

        let name = self
            .structured_name(structured, &mut rejected)
            .or_else(|| self.text_name(text, &mut rejected))
            .map(|(name, winner)| {
                accepted.push(winner);
                name
            });

        // Registry numbers must not echo the tax id or a welfare number.
        let mut blocked = welfare;
        if let Some(digits) = &tax_digits {
            blocked.insert(digits.clone());
        }
        let id_number = self
            .structured_id_number(structured, &blocked, &mut rejected)
            .or_else(|| self.text_id_number(text, &blocked, &mut rejected))
            .map(|(id, winner)| {
                accepted.push(winner);
                id
            });

        let tax_id = tax_digits
            .and_then(|digits| self.validator.format(&digits))
            .unwrap_or_default();

        info!(
            "Extracted fields: name={:?} tax_id={:?} id_number={:?}",
            name, tax_id, id_number
        );

        ExtractedFields {
            name: name.unwrap_or_default(),
            tax_id,
            id_number: id_number.unwrap_or_default(),
            accepted,
            rejected,
        }
    }

    /// Digit strings of every NIS/PIS/PASEP/NIT number found in either source.
    pub fn welfare_numbers(
        &self,
        text: &str,
        structured: &BTreeMap<String, String>,
    ) -> HashSet<String> {
        let mut numbers = HashSet::new();
        for pattern in &self.welfare_patterns {
            for captures in pattern.captures_iter(text) {
                if let Some(value) = captures.get(1) {
                    numbers.insert(digits_of(value.as_str()));
                }
            }
        }
        for value in structured_values(structured, &self.keys.welfare, &[]) {
            let corrected = FieldCorrection::correct_numeric(value);
            for found in self.tax_id_value.find_iter(&corrected) {
                numbers.insert(digits_of(found.as_str()));
            }
            let digits = digits_of(&corrected);
            if digits.len() == 11 {
                numbers.insert(digits);
            }
        }
        numbers
    }

    fn structured_tax_id(
        &self,
        structured: &BTreeMap<String, String>,
        welfare: &HashSet<String>,
        rejected: &mut Vec<FieldCandidate>,
    ) -> Option<(String, FieldCandidate)> {
        for value in structured_values(structured, &self.keys.tax_id, &[]) {
            let corrected = FieldCorrection::correct_numeric(value);
            let mut readings: Vec<String> = self
                .tax_id_value
                .find_iter(&corrected)
                .map(|m| digits_of(m.as_str()))
                .collect();
            readings.push(self.validator.clean(&corrected));

            let accepted = readings
                .into_iter()
                .find(|digits| !welfare.contains(digits) && self.validator.validate(digits));
            match accepted {
                Some(digits) => {
                    debug!("Tax id taken from structured field: {}", value);
                    return Some((digits, accepted_candidate(FieldName::TaxId, value, FieldSource::Structured)));
                }
                None => rejected.push(candidate(FieldName::TaxId, value, FieldSource::Structured)),
            }
        }
        None
    }

    fn text_tax_id(
        &self,
        text: &str,
        welfare: &HashSet<String>,
        rejected: &mut Vec<FieldCandidate>,
    ) -> Option<(String, FieldCandidate)> {
        // Pass 1: values anchored to a tax id label
        for pattern in &self.tax_id_labeled {
            for captures in pattern.captures_iter(text) {
                let Some(value) = captures.get(1) else { continue };
                let digits = self.validator.clean(value.as_str());
                if !welfare.contains(&digits) && self.validator.validate(&digits) {
                    return Some((digits, accepted_candidate(FieldName::TaxId, value.as_str(), FieldSource::FreeText)));
                }
                rejected.push(candidate(FieldName::TaxId, value.as_str(), FieldSource::FreeText));
            }
        }

        // Pass 2: any 11-digit shape, gated by exclusion, checksum and surrounding words
        let mut favored = None;
        let mut last_resort = None;
        for pattern in &self.tax_id_unlabeled {
            for captures in pattern.captures_iter(text) {
                let Some(value) = captures.get(1) else { continue };
                let digits = self.validator.clean(value.as_str());
                if welfare.contains(&digits) || !self.validator.validate(&digits) {
                    rejected.push(candidate(FieldName::TaxId, value.as_str(), FieldSource::FreeText));
                    continue;
                }
                match self.context_verdict(text, value.start(), value.end()) {
                    ContextVerdict::Favored => {
                        favored.get_or_insert((digits, value.as_str()));
                    }
                    ContextVerdict::Neutral => {
                        last_resort.get_or_insert((digits, value.as_str()));
                    }
                    ContextVerdict::Rejected => {
                        debug!("Unlabeled number {} sits in welfare context", value.as_str());
                        rejected.push(candidate(FieldName::TaxId, value.as_str(), FieldSource::FreeText));
                    }
                }
            }
        }
        favored
            .or(last_resort)
            .map(|(digits, raw)| (digits, accepted_candidate(FieldName::TaxId, raw, FieldSource::FreeText)))
    }

    fn context_verdict(&self, text: &str, start: usize, end: usize) -> ContextVerdict {
        let context = context_window(text, start, end, self.context_window);
        let tax_hits = count_tokens(&context, &self.tax_id_tokens);
        let welfare_hits = count_tokens(&context, &self.welfare_tokens);
        if tax_hits > welfare_hits {
            ContextVerdict::Favored
        } else if tax_hits == 0 && welfare_hits == 0 {
            ContextVerdict::Neutral
        } else {
            ContextVerdict::Rejected
        }
    }

    fn structured_name(
        &self,
        structured: &BTreeMap<String, String>,
        rejected: &mut Vec<FieldCandidate>,
    ) -> Option<(String, FieldCandidate)> {
        for value in structured_values(structured, &self.keys.name, &PARENT_QUALIFIERS) {
            match clean_name(value) {
                Some(name) => return Some((name, accepted_candidate(FieldName::Name, value, FieldSource::Structured))),
                None => rejected.push(candidate(FieldName::Name, value, FieldSource::Structured)),
            }
        }
        None
    }

    fn text_name(&self, text: &str, rejected: &mut Vec<FieldCandidate>) -> Option<(String, FieldCandidate)> {
        for pattern in &self.name_patterns {
            for captures in pattern.captures_iter(text) {
                let Some(value) = captures.get(1) else { continue };
                match clean_name(value.as_str()) {
                    Some(name) => {
                        return Some((name, accepted_candidate(FieldName::Name, value.as_str(), FieldSource::FreeText)))
                    }
                    None => rejected.push(candidate(FieldName::Name, value.as_str(), FieldSource::FreeText)),
                }
            }
        }
        None
    }

    fn structured_id_number(
        &self,
        structured: &BTreeMap<String, String>,
        blocked: &HashSet<String>,
        rejected: &mut Vec<FieldCandidate>,
    ) -> Option<(String, FieldCandidate)> {
        for value in structured_values(structured, &self.keys.id_number, &[]) {
            match accept_id_number(value, blocked) {
                Some(id) => return Some((id, accepted_candidate(FieldName::IdNumber, value, FieldSource::Structured))),
                None => rejected.push(candidate(FieldName::IdNumber, value, FieldSource::Structured)),
            }
        }
        None
    }

    fn text_id_number(
        &self,
        text: &str,
        blocked: &HashSet<String>,
        rejected: &mut Vec<FieldCandidate>,
    ) -> Option<(String, FieldCandidate)> {
        for pattern in &self.id_number_patterns {
            for captures in pattern.captures_iter(text) {
                let Some(value) = captures.get(1) else { continue };
                match accept_id_number(value.as_str(), blocked) {
                    Some(id) => {
                        return Some((id, accepted_candidate(FieldName::IdNumber, value.as_str(), FieldSource::FreeText)))
                    }
                    None => rejected.push(candidate(FieldName::IdNumber, value.as_str(), FieldSource::FreeText)),
                }
            }
        }
        None
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, DocumentError> {
    patterns.iter().map(|p| compile_one(p)).collect()
}

fn compile_one(pattern: &str) -> Result<Regex, DocumentError> {
    Regex::new(pattern).map_err(|e| DocumentError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn lowercase_all(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| t.to_lowercase()).collect()
}

fn candidate(field_name: FieldName, raw_value: &str, source: FieldSource) -> FieldCandidate {
    FieldCandidate {
        field_name,
        raw_value: raw_value.trim().to_string(),
        source,
        valid: false,
    }
}

fn accepted_candidate(field_name: FieldName, raw_value: &str, source: FieldSource) -> FieldCandidate {
    FieldCandidate {
        valid: true,
        ..candidate(field_name, raw_value, source)
    }
}

fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Lower-cased words of a key, joined by single spaces: "C.P.F:" becomes "c p f".
fn key_phrase(key: &str) -> String {
    key.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_spellings(spellings: &[String]) -> Vec<String> {
    spellings
        .iter()
        .map(|s| key_phrase(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Values whose key matches one of the spellings. Exact key matches come first,
/// then keys that contain a spelling as a whole-word phrase not followed by one
/// of `excluded_next`.
fn structured_values<'a>(
    structured: &'a BTreeMap<String, String>,
    spellings: &[String],
    excluded_next: &[&str],
) -> Vec<&'a str> {
    let phrases: Vec<(String, &'a str)> = structured
        .iter()
        .map(|(key, value)| (key_phrase(key), value.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for spelling in spellings {
        for (index, (phrase, value)) in phrases.iter().enumerate() {
            if phrase == spelling && seen.insert(index) {
                values.push(*value);
            }
        }
    }
    for spelling in spellings {
        let needle = format!(" {} ", spelling);
        for (index, (phrase, value)) in phrases.iter().enumerate() {
            let padded = format!(" {} ", phrase);
            let Some(at) = padded.find(&needle) else { continue };
            let next = padded[at + needle.len()..].split(' ').next().unwrap_or("");
            if !excluded_next.contains(&next) && seen.insert(index) {
                values.push(*value);
            }
        }
    }
    values
}

/// Letters-only, whitespace-collapsed, title-cased name. Rejects single words,
/// short captures and anything containing digits.
fn clean_name(raw: &str) -> Option<String> {
    if raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let letters: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = letters.split_whitespace().collect();
    let joined = words.join(" ");
    if words.len() < 2 || joined.chars().count() < MIN_NAME_LEN {
        return None;
    }
    Some(words.iter().map(|w| title_case(w)).collect::<Vec<_>>().join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn accept_id_number(raw: &str, blocked: &HashSet<String>) -> Option<String> {
    let value = raw.trim().trim_end_matches('.').to_uppercase();
    let digits = digits_of(&value);
    if digits.len() < MIN_ID_DIGITS || blocked.contains(&digits) {
        return None;
    }
    Some(value)
}

/// Lower-cased text around a match, `radius` characters to each side.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[from..to].to_lowercase()
}

// Plain tokens count as whole words; dotted ones like "c.p.f" as substrings.
fn count_tokens(context: &str, tokens: &[String]) -> usize {
    let words: Vec<&str> = context
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    tokens
        .iter()
        .map(|token| {
            if token.chars().all(char::is_alphanumeric) {
                words.iter().filter(|w| **w == token.as_str()).count()
            } else {
                context.matches(token.as_str()).count()
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::OverflowPolicy;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&FieldPatterns::default(), TaxIdValidator::default()).unwrap()
    }

    fn no_fields() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_labeled_tax_id() {
        let result = extractor().extract("CPF 111.444.777-35", &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_welfare_number_next_to_tax_id_label_before() {
        let text = "CPF 111.444.777-35 NIS 12345678909";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_welfare_number_next_to_tax_id_label_after_linebreak() {
        let text = "NIS\n123.456.789-09\nCPF\n111.444.777-35";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_welfare_number_next_to_tax_id_label_with_colon() {
        let text = "PIS/PASEP: 12345678909 CPF: 11144477735";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_valid_welfare_number_never_becomes_tax_id() {
        // 123.456.789-09 passes the checksum, so only the exclusion set stops it
        let extractor = extractor();
        for text in [
            "NIS: 123.456.789-09",
            "CPF:\nPIS: 12345678909",
            "NIS/PIS/PASEP 12345678909\nRG: 12.345.678-9",
        ] {
            let result = extractor.extract(text, &no_fields());
            assert_eq!(result.tax_id, "", "welfare number leaked from {:?}", text);
        }
    }

    #[test]
    fn test_structured_welfare_key_excludes_number() {
        let structured = fields(&[("nis/pis/pasep", "12345678909")]);
        let result = extractor().extract("Número: 123.456.789-09", &structured);
        assert_eq!(result.tax_id, "");
    }

    #[test]
    fn test_unlabeled_fallback_last_resort() {
        let text = "DOCUMENTO DE IDENTIFICAÇÃO\nNúmero: 111.444.777-35\nData: 01/01/2020";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_unlabeled_fallback_rejects_welfare_context() {
        let text = "Inscrição PIS-PASEP\nNúmero 111.444.777-35";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "");
        assert!(result
            .rejected
            .iter()
            .any(|c| c.field_name == FieldName::TaxId && c.raw_value == "111.444.777-35"));
    }

    #[test]
    fn test_unlabeled_fallback_prefers_tax_context() {
        // first number has no context, the second sits next to "pessoa física"
        let text = format!(
            "Protocolo 529.982.247-25{}Pessoa física 111.444.777-35",
            "\n".repeat(60)
        );
        let result = extractor().extract(&text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_invalid_labeled_candidate_skipped() {
        let text = "CPF: 111.444.777-36\nC.P.F. 529.982.247-25";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "529.982.247-25");
        assert_eq!(result.rejected[0].raw_value, "111.444.777-36");
        assert_eq!(result.rejected[0].source, FieldSource::FreeText);
    }

    #[test]
    fn test_structured_overrides_free_text() {
        let structured = fields(&[("cpf", "111.444.777-35")]);
        let result = extractor().extract("CPF 529.982.247-25", &structured);
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_invalid_structured_tax_id_does_not_override() {
        let structured = fields(&[("cpf", "111.444.777-36")]);
        let result = extractor().extract("CPF 529.982.247-25", &structured);
        assert_eq!(result.tax_id, "529.982.247-25");
        assert!(result
            .rejected
            .iter()
            .any(|c| c.source == FieldSource::Structured && c.field_name == FieldName::TaxId));
    }

    #[test]
    fn test_structured_tax_id_ocr_corrections() {
        let structured = fields(&[("c.p.f", "111.444.777-3S")]);
        let result = extractor().extract("", &structured);
        assert_eq!(result.tax_id, "111.444.777-35");
    }

    #[test]
    fn test_structured_tax_id_fourteen_digit_overflow() {
        let structured = fields(&[("cpf", "200~111444777/35")]);
        assert_eq!(extractor().extract("", &structured).tax_id, "111.444.777-35");

        let strict = FieldExtractor::new(
            &FieldPatterns::default(),
            TaxIdValidator::new(OverflowPolicy::Reject),
        )
        .unwrap();
        assert_eq!(strict.extract("", &structured).tax_id, "");
    }

    #[test]
    fn test_name_from_label() {
        let text = "REGISTRO GERAL\nNome: JOÃO DA SILVA SANTOS\nCPF: 111.444.777-35";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.name, "João Da Silva Santos");
    }

    #[test]
    fn test_single_word_name_rejected() {
        let text = "Nome: MARIA\nFiliação";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.name, "");
        assert!(result.rejected.iter().any(|c| c.field_name == FieldName::Name));
    }

    #[test]
    fn test_structured_name_with_digits_falls_back_to_text() {
        let structured = fields(&[("nome", "ANA 2 COSTA")]);
        let result = extractor().extract("Nome: ANA MARIA COSTA", &structured);
        assert_eq!(result.name, "Ana Maria Costa");
    }

    #[test]
    fn test_structured_name_wins() {
        let structured = fields(&[("nome completo", "PEDRO  ÁLVARES CABRAL")]);
        let result = extractor().extract("Nome: ANA MARIA COSTA", &structured);
        assert_eq!(result.name, "Pedro Álvares Cabral");
    }

    #[test]
    fn test_rg_number() {
        let text = "CPF: 111.444.777-35\nRG: 12.345.678-9";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.id_number, "12.345.678-9");
    }

    #[test]
    fn test_registry_number_echoing_tax_id_rejected() {
        let text = "REGISTRO: 111.444.777-35\nCPF 111.444.777-35\nREGISTRO 4.123.456";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.tax_id, "111.444.777-35");
        assert_eq!(result.id_number, "4.123.456");
        assert!(result
            .rejected
            .iter()
            .any(|c| c.field_name == FieldName::IdNumber && c.raw_value == "111.444.777-35"));
    }

    #[test]
    fn test_passport_number() {
        let text = "REPÚBLICA FEDERATIVA DO BRASIL\nPASSAPORTE Nº fb123456";
        let result = extractor().extract(text, &no_fields());
        assert_eq!(result.id_number, "FB123456");
    }

    #[test]
    fn test_structured_id_number() {
        let structured = fields(&[("registro geral", "MG-12.345.678")]);
        let result = extractor().extract("RG: 98.765.432-1", &structured);
        assert_eq!(result.id_number, "MG-12.345.678");
    }

    #[test]
    fn test_nothing_found_is_empty_not_error() {
        let result = extractor().extract("texto sem campos", &no_fields());
        assert_eq!(result.name, "");
        assert_eq!(result.tax_id, "");
        assert_eq!(result.id_number, "");
    }

    #[test]
    fn test_structured_key_matching() {
        let structured = fields(&[
            ("nome do pai", "JOSE SOUZA"),
            ("nome", "MARIA SOUZA"),
            ("cpf/mf", "111.444.777-35"),
        ]);
        let names = structured_values(&structured, &normalize_spellings(&["nome".to_string()]), &[]);
        assert_eq!(names, vec!["MARIA SOUZA", "JOSE SOUZA"]);
        let names = structured_values(
            &structured,
            &normalize_spellings(&["nome".to_string()]),
            &PARENT_QUALIFIERS,
        );
        assert_eq!(names, vec!["MARIA SOUZA"]);
        let tax = structured_values(
            &structured,
            &normalize_spellings(&["c.p.f".to_string(), "cpf".to_string()]),
            &[],
        );
        assert_eq!(tax, vec!["111.444.777-35"]);
    }

    #[test]
    fn test_parent_name_keys_not_taken_as_holder() {
        let structured = fields(&[
            ("nome do pai", "JOSE SOUZA"),
            ("nome da mãe", "ANA SOUZA"),
            ("nome social", "CARLA SOUZA LIMA"),
        ]);
        let result = extractor().extract("Nome: MARIA SOUZA LIMA", &structured);
        assert_eq!(result.name, "Carla Souza Lima");

        let parents_only = fields(&[("nome do pai", "JOSE SOUZA"), ("nome da mãe", "ANA SOUZA")]);
        let result = extractor().extract("Nome: MARIA SOUZA LIMA", &parents_only);
        assert_eq!(result.name, "Maria Souza Lima");
        assert_eq!(result.accepted[0].source, FieldSource::FreeText);
    }

    #[test]
    fn test_winning_candidates_marked_valid() {
        let text = "Nome: ANA MARIA COSTA\nCPF: 111.444.777-36\nCPF: 111.444.777-35\nRG: 12.345.678-9";
        let result = extractor().extract(text, &fields(&[("rg", "98.765.432-1")]));

        let accepted: Vec<(FieldName, &str, FieldSource)> = result
            .accepted
            .iter()
            .map(|c| (c.field_name, c.raw_value.as_str(), c.source))
            .collect();
        assert_eq!(
            accepted,
            vec![
                (FieldName::TaxId, "111.444.777-35", FieldSource::FreeText),
                (FieldName::Name, "ANA MARIA COSTA", FieldSource::FreeText),
                (FieldName::IdNumber, "98.765.432-1", FieldSource::Structured),
            ]
        );
        assert!(result.accepted.iter().all(|c| c.valid));
        assert!(result.rejected.iter().all(|c| !c.valid));
        assert_eq!(result.rejected[0].raw_value, "111.444.777-36");
    }

    #[test]
    fn test_context_window_respects_char_boundaries() {
        let text = "ééééé 111.444.777-35 ççççç";
        let start = text.find('1').unwrap();
        let end = start + "111.444.777-35".len();
        assert_eq!(context_window(text, start, end, 3), "éé 111.444.777-35 çç");
    }
}
