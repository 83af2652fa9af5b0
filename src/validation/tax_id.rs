use serde::{Deserialize, Serialize};

const TAX_ID_LEN: usize = 11;

/// What `clean` does when a value carries more than 11 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Trailing 11 digits for 14-digit strings (OCR glued a prefix on), leading 11 otherwise.
    #[default]
    TrailingOnFourteen,
    /// Keep every digit, so anything longer than 11 fails validation.
    Reject,
}

/// Checksum validation for the 11-digit individual taxpayer id (CPF).
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxIdValidator {
    overflow: OverflowPolicy,
}

impl TaxIdValidator {
    pub fn new(overflow: OverflowPolicy) -> Self {
        TaxIdValidator { overflow }
    }

    /// Strips everything but digits and applies the overflow policy.
    pub fn clean(&self, id: &str) -> String {
        let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() <= TAX_ID_LEN {
            return digits;
        }
        match self.overflow {
            OverflowPolicy::TrailingOnFourteen if digits.len() == 14 => {
                digits[digits.len() - TAX_ID_LEN..].to_string()
            }
            OverflowPolicy::TrailingOnFourteen => digits[..TAX_ID_LEN].to_string(),
            OverflowPolicy::Reject => digits,
        }
    }

    pub fn validate(&self, id: &str) -> bool {
        let cleaned = self.clean(id);
        if cleaned.len() != TAX_ID_LEN {
            return false;
        }

        let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != TAX_ID_LEN || digits.iter().all(|&d| d == digits[0]) {
            return false;
        }

        check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
    }

    /// Renders a value as `000.000.000-00`, or `None` when it does not clean to 11 digits.
    pub fn format(&self, id: &str) -> Option<String> {
        let d = self.clean(id);
        if d.len() != TAX_ID_LEN {
            return None;
        }
        Some(format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]))
    }
}

// Weights run from len+1 down to 2; results of 10 or 11 map to 0.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let digit = 11 - (sum % 11);
    if digit >= 10 {
        0
    } else {
        digit
    }
}
