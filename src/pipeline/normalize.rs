//! Text canonicalization. Pure, total, idempotent: `normalize(normalize(s))
//! == normalize(s)` for any UTF-8 input, with no locale or env dependence.

use crate::pipeline::classify::is_arabic;

/// Canonicalize raw transcript text. Rules, in order: CRLF → LF; strip soft
/// hyphens; strip zero-width characters (ZWNJ/ZWJ/BOM) unless both neighbors
/// are Arabic, since joiners between Arabic letters affect shaping; collapse
/// runs of horizontal whitespace to one space; trim.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n");
    let chars: Vec<char> = unified.chars().collect();

    let mut stripped = String::with_capacity(unified.len());
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\u{00AD}' => {}
            '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {
                let prev = i.checked_sub(1).and_then(|j| chars.get(j));
                let next = chars.get(i + 1);
                if let (Some(&p), Some(&n)) = (prev, next) {
                    if is_arabic(p) && is_arabic(n) {
                        stripped.push(c);
                    }
                }
            }
            _ => stripped.push(c),
        }
    }

    let mut out = String::with_capacity(stripped.len());
    let mut in_space = false;
    for c in stripped.chars() {
        if c != '\n' && c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }

    out.trim().to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_on_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t  "), "");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "",
            "  çift   boşluk  ",
            "satır\r\nsonu",
            "soft\u{00AD}hyphen",
            "بِسْمِ\u{200D}اللَّهِ",
            "zero\u{200C}width latin",
            "\u{FEFF}bom başta",
        ];
        for raw in inputs {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn crlf_to_lf() {
        assert_eq!(normalize("bir\r\niki"), "bir\niki");
    }

    #[test]
    fn strips_soft_hyphen() {
        assert_eq!(normalize("kar\u{00AD}deş"), "kardeş");
    }

    #[test]
    fn keeps_joiner_between_arabic_letters() {
        let raw = "ل\u{200D}ا";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn strips_joiner_next_to_latin() {
        assert_eq!(normalize("ve\u{200D}ya"), "veya");
        // one Arabic neighbor is not enough
        assert_eq!(normalize("a\u{200C}ب"), "aب");
    }

    #[test]
    fn collapses_horizontal_whitespace_only() {
        assert_eq!(normalize("bir \t  iki\nüç"), "bir iki\nüç");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(normalize("  ortada  "), "ortada");
    }
}
