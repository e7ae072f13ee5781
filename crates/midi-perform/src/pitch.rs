//! Note names in the C3 = 60 convention.

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// `note_name(60) == "C3"`, `note_name(0) == "C-2"`.
pub fn note_name(number: u8) -> String {
    let octave = (number / 12) as i32 - 2;
    format!("{}{}", PITCH_CLASSES[(number % 12) as usize], octave)
}

/// Parse a name such as `C3`, `c#3`, `A-1` or `G8` to a note number.
///
/// Returns `None` for malformed names or results outside 0..=127.
pub fn parse_note_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let rest = chars.as_str();
    let (sharp, octave) = match rest.strip_prefix('#') {
        Some(octave) => (true, octave),
        None => (false, rest),
    };

    let class = PITCH_CLASSES
        .iter()
        .position(|pc| pc.len() == 1 && pc.starts_with(letter))? as i32
        + sharp as i32;

    if octave.is_empty() || !octave.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let octave: i32 = octave.parse().ok()?;
    let number = octave.checked_add(2)?.checked_mul(12)?.checked_add(class)?;
    u8::try_from(number).ok().filter(|n| *n <= 127)
}

/// Parse a note specifier: a number, a name, or a comma-separated list of either.
///
/// Empty list items are skipped. Any invalid item fails the whole specifier
/// and is returned as the error.
pub fn parse_note_numbers(spec: &str) -> Result<Vec<u8>, String> {
    let mut numbers = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = if item.chars().all(|c| c.is_ascii_digit()) {
            item.parse::<u8>().ok().filter(|n| *n <= 127)
        } else {
            parse_note_name(item)
        };
        match parsed {
            Some(n) => numbers.push(n),
            None => return Err(item.to_string()),
        }
    }
    if numbers.is_empty() {
        return Err(spec.to_string());
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_from_numbers() {
        assert_eq!(note_name(60), "C3");
        assert_eq!(note_name(61), "C#3");
        assert_eq!(note_name(0), "C-2");
        assert_eq!(note_name(127), "G8");
    }

    #[test]
    fn numbers_from_names() {
        assert_eq!(parse_note_name("C3"), Some(60));
        assert_eq!(parse_note_name("c#3"), Some(61));
        assert_eq!(parse_note_name("C-2"), Some(0));
        assert_eq!(parse_note_name("B-1"), Some(23));
        assert_eq!(parse_note_name("H3"), None);
        assert_eq!(parse_note_name("G#8"), None);
        assert_eq!(parse_note_name("C"), None);
        assert_eq!(parse_note_name("C999999999"), None);
        assert_eq!(parse_note_name("C-999999999"), None);
        assert_eq!(parse_note_name("C99999999999"), None);
    }

    #[test]
    fn round_trip_every_note() {
        for n in 0..=127u8 {
            assert_eq!(parse_note_name(&note_name(n)), Some(n));
        }
    }

    #[test]
    fn note_specifier_lists() {
        assert_eq!(parse_note_numbers("60"), Ok(vec![60]));
        assert_eq!(parse_note_numbers("60, D3,"), Ok(vec![60, 62]));
        assert_eq!(parse_note_numbers("60, X9"), Err("X9".to_string()));
        assert_eq!(parse_note_numbers(" , "), Err(" , ".to_string()));
        assert_eq!(parse_note_numbers("200"), Err("200".to_string()));
        assert_eq!(parse_note_numbers("C3, C999999999"), Err("C999999999".to_string()));
    }
}
