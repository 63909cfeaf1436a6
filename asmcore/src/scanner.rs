//! Splits source text into physical lines and, for each one, applies the
//! label/mnemonic disambiguation rules: an identifier followed by `:` is
//! always a label; one followed by `EQU`/`=` labels an equate; a
//! non-indented identifier that is not a known keyword is an implicit
//! label; otherwise it is a mnemonic or directive.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct AsmParser;

use pest::Parser;

const EQUATE_KEYWORDS: &[&str] = &["EQU", "=", ".EQU", ".SET"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedLine {
    /// Present when the line defines a label — either `NAME:` or the
    /// `NAME EQU expr` / `NAME = expr` forms.
    pub label: Option<String>,
    /// The mnemonic or directive keyword, already present as written
    /// (case untouched; callers fold to upper except for `.L`-local
    /// labels, which this scanner never folds at all).
    pub keyword: Option<String>,
    /// Raw, unsplit text following the keyword.
    pub operand_text: String,
}

impl ScannedLine {
    fn empty() -> ScannedLine {
        ScannedLine {
            label: None,
            keyword: None,
            operand_text: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanError(pub String);

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `is_known_keyword` receives an upper-folded candidate and answers
/// whether it names a real mnemonic or directive; used to disambiguate a
/// non-indented bare identifier from an implicit label.
pub fn scan_line(
    raw: &str,
    is_known_keyword: impl Fn(&str) -> bool,
) -> Result<ScannedLine, ScanError> {
    let indented = raw.starts_with(' ') || raw.starts_with('\t');

    let mut pairs = AsmParser::parse(Rule::line, raw).map_err(|e| ScanError(e.to_string()))?;
    let line_pair = pairs.next().unwrap();

    let mut label: Option<String> = None;
    let mut first_word: Option<String> = None;
    let mut rest: String = String::new();

    for pair in line_pair.into_inner() {
        match pair.as_rule() {
            Rule::colon_label => {
                let ident = pair.into_inner().next().unwrap().as_str();
                label = Some(fold_label(ident));
            }
            Rule::first_word => first_word = Some(pair.as_str().to_string()),
            Rule::rest_of_line => rest = pair.as_str().trim().to_string(),
            Rule::comment | Rule::EOI => {}
            _ => {}
        }
    }

    if label.is_some() {
        let keyword = first_word;
        return Ok(ScannedLine {
            label,
            keyword,
            operand_text: rest,
        });
    }

    let Some(word) = first_word else {
        return Ok(ScannedLine::empty());
    };

    let (second_word, remainder) = split_first_token(&rest);
    if let Some(second) = second_word {
        if EQUATE_KEYWORDS.contains(&second.to_uppercase().as_str()) {
            return Ok(ScannedLine {
                label: Some(fold_label(&word)),
                keyword: Some(second.to_string()),
                operand_text: remainder.trim().to_string(),
            });
        }
    }

    if !indented && !is_known_keyword(&word.to_uppercase()) {
        // A bare, non-indented, non-keyword identifier is an implicit
        // label. If more text follows, it is itself a statement.
        if rest.is_empty() {
            return Ok(ScannedLine {
                label: Some(fold_label(&word)),
                keyword: None,
                operand_text: String::new(),
            });
        }
        let (next_word, next_rest) = split_first_token(&rest);
        return Ok(ScannedLine {
            label: Some(fold_label(&word)),
            keyword: next_word.map(|s| s.to_string()),
            operand_text: next_rest.trim().to_string(),
        });
    }

    Ok(ScannedLine {
        label: None,
        keyword: Some(word),
        operand_text: rest,
    })
}

/// Local labels (`.L...`) keep their case; everything else folds to upper.
fn fold_label(name: &str) -> String {
    if name.starts_with(".L") {
        name.to_string()
    } else {
        name.to_uppercase()
    }
}

fn split_first_token(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => (Some(&trimmed[..idx]), &trimmed[idx..]),
        None if trimmed.is_empty() => (None, ""),
        None => (Some(trimmed), ""),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn known(name: &str) -> bool {
        matches!(name, "LDA" | "NOP" | "BNE" | ".BYTE" | ".ORG")
    }

    #[test]
    fn colon_label_alone() {
        let line = scan_line("LOOP:", known).unwrap();
        assert_eq!(line.label.as_deref(), Some("LOOP"));
        assert_eq!(line.keyword, None);
    }

    #[test]
    fn colon_label_with_statement() {
        let line = scan_line("LOOP: LDA #$42", known).unwrap();
        assert_eq!(line.label.as_deref(), Some("LOOP"));
        assert_eq!(line.keyword.as_deref(), Some("LDA"));
        assert_eq!(line.operand_text, "#$42");
    }

    #[test]
    fn bare_mnemonic_with_leading_whitespace() {
        let line = scan_line("  LDA #$42", known).unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.keyword.as_deref(), Some("LDA"));
        assert_eq!(line.operand_text, "#$42");
    }

    #[test]
    fn equate_without_colon() {
        let line = scan_line("COUNT EQU 5", known).unwrap();
        assert_eq!(line.label.as_deref(), Some("COUNT"));
        assert_eq!(line.keyword.as_deref(), Some("EQU"));
        assert_eq!(line.operand_text, "5");
    }

    #[test]
    fn bare_label_not_indented_and_not_a_keyword() {
        let line = scan_line("START NOP", known).unwrap();
        assert_eq!(line.label.as_deref(), Some("START"));
        assert_eq!(line.keyword.as_deref(), Some("NOP"));
    }

    #[test]
    fn blank_line() {
        let line = scan_line("", known).unwrap();
        assert_eq!(line, ScannedLine::empty());
    }

    #[test]
    fn comment_only_line() {
        let line = scan_line("   ; just a comment", known).unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.keyword, None);
    }

    #[test]
    fn local_label_preserves_case() {
        let line = scan_line(".Lloop: NOP", known).unwrap();
        assert_eq!(line.label.as_deref(), Some(".Lloop"));
    }
}
