use crate::models::DocumentType;
use serde::{Deserialize, Serialize};

// Shape of a tax id value: 000.000.000-00, bare 11 digits, or OCR spacing in between.
const TAX_ID_VALUE: &str = r"(\d{3}[. ]?\d{3}[. ]?\d{3}[-. ]?\d{2})";
// RG/registry numbers: digits with optional dots and a check suffix that may be X.
const REGISTRY_VALUE: &str = r"(\d[\d.]*\d(?:-[\dxX]{1,2})?)";
const NUMBER_PREFIX: &str = r"(?:n[º°o.]*\s*)?";

/// Signature phrases for one document type. Matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSet {
    pub document_type: DocumentType,
    pub patterns: Vec<String>,
}

/// Known key spellings in the forms output, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredKeys {
    pub name: Vec<String>,
    pub tax_id: Vec<String>,
    pub id_number: Vec<String>,
    pub welfare: Vec<String>,
}

impl Default for StructuredKeys {
    fn default() -> Self {
        StructuredKeys {
            name: strings(&["nome", "nome completo", "name", "titular"]),
            tax_id: strings(&[
                "cpf",
                "c.p.f",
                "cadastro de pessoa física",
                "cadastro de pessoas físicas",
            ]),
            id_number: strings(&[
                "rg",
                "registro geral",
                "identidade",
                "registro",
                "passaporte",
                "passport",
            ]),
            welfare: strings(&["nis", "pis", "pasep", "nit"]),
        }
    }
}

/// Regex tables for field extraction, each list in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldPatterns {
    pub name: Vec<String>,
    pub tax_id_labeled: Vec<String>,
    pub tax_id_unlabeled: Vec<String>,
    pub welfare: Vec<String>,
    pub id_number: Vec<String>,
    pub tax_id_context_tokens: Vec<String>,
    pub welfare_context_tokens: Vec<String>,
    /// Characters inspected on each side of an unlabeled tax id hit.
    pub context_window: usize,
    pub structured_keys: StructuredKeys,
}

impl Default for FieldPatterns {
    fn default() -> Self {
        FieldPatterns {
            name: vec![
                r"\b(?i:nome|name|titular)\b\s*[:\-]?\s*(\p{Lu}[\p{L}'. \t-]*)".to_string(),
            ],
            tax_id_labeled: vec![
                format!(r"(?i)\bcpf(?:\s*/\s*mf)?\s*[:\-.]?\s*{}\b", TAX_ID_VALUE),
                format!(r"(?i)\bc\.\s?p\.\s?f\.?\s*[:\-]?\s*{}\b", TAX_ID_VALUE),
                format!(
                    r"(?i)\bcadastro\s+de\s+pessoas?\s+f[íi]sicas?\s*[:\-]?\s*{}\b",
                    TAX_ID_VALUE
                ),
            ],
            tax_id_unlabeled: vec![r"\b(\d{3}\.?\d{3}\.?\d{3}-?\d{2})\b".to_string()],
            welfare: vec![
                r"(?i)\b(?:nis|pis|pasep|nit)(?:\s*/\s*(?:nis|pis|pasep|nit))*\s*[:\-.]?\s*(\d{3}[. ]?\d{5}[. ]?\d{2}[-. ]?\d|\d{3}[. ]?\d{3}[. ]?\d{3}[-. ]?\d{2})\b"
                    .to_string(),
            ],
            id_number: vec![
                format!(r"(?i)\brg\b\s*[:\-.]?\s*{}{}", NUMBER_PREFIX, REGISTRY_VALUE),
                format!(r"(?i)\bregistro\s+geral\s*[:\-.]?\s*{}{}", NUMBER_PREFIX, REGISTRY_VALUE),
                format!(r"(?i)\bidentidade\s*[:\-.]?\s*{}{}", NUMBER_PREFIX, REGISTRY_VALUE),
                format!(r"(?i)\bregistro\s*[:\-.]?\s*{}{}", NUMBER_PREFIX, REGISTRY_VALUE),
                format!(
                    r"(?i)\b(?:passaporte|passport)\b\s*{}[:\-.]?\s*([A-Za-z]{{2}}\d{{6}})\b",
                    NUMBER_PREFIX
                ),
            ],
            tax_id_context_tokens: strings(&[
                "cpf", "c.p.f", "cadastro", "pessoa", "pessoas", "física", "fisica",
            ]),
            welfare_context_tokens: strings(&["nis", "pis", "pasep", "nit"]),
            context_window: 50,
            structured_keys: StructuredKeys::default(),
        }
    }
}

/// Every pattern table the classifier and extractor are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub signatures: Vec<SignatureSet>,
    pub fields: FieldPatterns,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            signatures: vec![
                SignatureSet {
                    document_type: DocumentType::Rg,
                    patterns: strings(&[
                        r"registro\s+geral",
                        r"carteira\s+de\s+identidade",
                        r"rep[úu]blica\s+federativa\s+do\s+brasil",
                        r"secretaria\s+de\s+seguran[çc]a",
                        r"instituto\s+de\s+identifica[çc][ãa]o",
                        r"\brg\s*:?\s*\d+",
                        r"identidade",
                    ]),
                },
                SignatureSet {
                    document_type: DocumentType::Cnh,
                    patterns: strings(&[
                        r"carteira\s+nacional\s+de\s+habilita[çc][ãa]o",
                        r"permiss[ãa]o\s+para\s+dirigir",
                        r"categoria",
                        r"validade",
                        r"\bcnh\s*:?\s*\d+",
                        r"registro\s*:?\s*\d+",
                        r"habilita[çc][ãa]o",
                        r"condutor",
                        r"detran",
                    ]),
                },
                SignatureSet {
                    document_type: DocumentType::Passport,
                    patterns: strings(&[
                        r"passaporte",
                        r"passport",
                        r"rep[úu]blica\s+federativa\s+do\s+brasil",
                        r"minist[ée]rio\s+das\s+rela[çc][õo]es\s+exteriores",
                        r"tipo\s*:\s*p\b",
                        r"pa[íi]s\s+de\s+emiss[ãa]o",
                    ]),
                },
            ],
            fields: FieldPatterns::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PatternConfig =
            serde_json::from_str(r#"{"fields": {"context_window": 80}}"#).unwrap();
        assert_eq!(config.fields.context_window, 80);
        assert_eq!(config.signatures.len(), 3);
        assert_eq!(config.fields.structured_keys, StructuredKeys::default());
        assert!(!config.fields.tax_id_labeled.is_empty());
    }

    #[test]
    fn test_signature_sets_cover_every_type() {
        let config = PatternConfig::default();
        let types: Vec<DocumentType> = config.signatures.iter().map(|s| s.document_type).collect();
        assert_eq!(
            types,
            vec![DocumentType::Rg, DocumentType::Cnh, DocumentType::Passport]
        );
    }
}
