/// OCR character fix-ups for numeric fields read by the forms engine.
///
/// Forms OCR often returns letters where the document prints digits
/// (`O` for `0`, `l` for `1`) and scatters stray punctuation through
/// the value. These corrections are only applied to values that are
/// expected to be numeric, never to names.
pub struct FieldCorrection;

impl FieldCorrection {
    pub fn correct_numeric(value: &str) -> String {
        value
            .chars()
            .filter_map(|c| match c {
                'O' | 'o' | 'D' | 'Q' => Some('0'),
                'l' | 'I' | '|' | '!' => Some('1'),
                'Z' | 'z' => Some('2'),
                'S' | 's' => Some('5'),
                'G' => Some('6'),
                'B' => Some('8'),
                // separators that belong to the printed format
                '.' | '-' | '/' | ' ' => Some(c),
                c if c.is_ascii_digit() => Some(c),
                _ => None,
            })
            .collect()
    }
}
