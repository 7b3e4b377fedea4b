//! External-reference token extraction
//!
//! Excel writes references to other workbooks with the workbook part in
//! square brackets: `[Budget.xlsx]Sheet1!A1`, `'C:\dir\[Budget.xlsx]Q1'!B2`,
//! or, once the link is stored inside the file, `[1]Sheet1!A1`. This module
//! finds that bracketed part and classifies it. It is a lightweight pattern
//! search, not a formula grammar.

/// Find the first non-empty bracketed substring of a formula
///
/// Brackets inside double-quoted string literals are ignored. The bracket
/// structure outside literals must be well formed (no nesting, no stray `]`,
/// no unclosed `[`); otherwise there is no token at all.
///
/// ```
/// use bookdeps_formula::first_bracketed;
///
/// assert_eq!(first_bracketed("=[Budget.xlsx]Sheet1!A1"), Some("Budget.xlsx"));
/// assert_eq!(first_bracketed("=[1]Sheet1!A1+[2]Sheet1!A1"), Some("1"));
/// assert_eq!(first_bracketed("=\"[x]\"&A1"), None);
/// assert_eq!(first_bracketed("=[Budget.xlsx Sheet1!A1"), None);
/// ```
pub fn first_bracketed(formula: &str) -> Option<&str> {
    let bytes = formula.as_bytes();
    let mut in_string = false;
    let mut open: Option<usize> = None;
    let mut first: Option<&str> = None;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            // `""` inside a literal toggles twice, which leaves us inside it
            b'"' if open.is_none() => in_string = !in_string,
            _ if in_string => {}
            b'[' => {
                if open.is_some() {
                    return None;
                }
                open = Some(i);
            }
            b']' => {
                let start = open.take()?;
                let inner = formula[start + 1..i].trim();
                if first.is_none() && !inner.is_empty() {
                    first = Some(inner);
                }
            }
            _ => {}
        }
    }

    if open.is_some() {
        return None;
    }
    first
}

/// A classified bracket token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceToken<'a> {
    /// `[N]`: 1-based position in the upload order
    Positional(&'a str),
    /// Anything else: a workbook name, stem, or path to one
    Named(&'a str),
}

impl<'a> ReferenceToken<'a> {
    /// Classify a raw bracket token
    ///
    /// Named tokens lose any leading directory components, so
    /// `C:\Reports\Budget.xlsx` becomes `Budget.xlsx`.
    pub fn classify(token: &'a str) -> Self {
        let token = token.trim();
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            return ReferenceToken::Positional(token);
        }

        let file = token
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(token)
            .trim();
        ReferenceToken::Named(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_token_wins() {
        assert_eq!(
            first_bracketed("=[A.xlsx]S!A1+[B.xlsx]S!A1"),
            Some("A.xlsx")
        );
    }

    #[test]
    fn test_quoted_path_reference() {
        assert_eq!(
            first_bracketed(r"='C:\Reports\[Budget 2024.xlsx]Q1'!B2"),
            Some("Budget 2024.xlsx")
        );
    }

    #[test]
    fn test_no_brackets() {
        assert_eq!(first_bracketed("=SUM(A1:A9)"), None);
        assert_eq!(first_bracketed(""), None);
    }

    #[test]
    fn test_malformed_brackets() {
        assert_eq!(first_bracketed("=[[1]]Sheet1!A1"), None);
        assert_eq!(first_bracketed("=A1]+[B.xlsx]S!A1"), None);
        assert_eq!(first_bracketed("=[B.xlsx]S!A1+[C"), None);
    }

    #[test]
    fn test_empty_brackets_skipped() {
        assert_eq!(first_bracketed("=[]+[ ]+[2]Sheet1!A1"), Some("2"));
        assert_eq!(first_bracketed("=[]"), None);
    }

    #[test]
    fn test_string_literals_ignored() {
        assert_eq!(
            first_bracketed("=\"see [Old.xlsx]\"&[New.xlsx]S!A1"),
            Some("New.xlsx")
        );
        // Escaped quote keeps us inside the literal
        assert_eq!(first_bracketed("=\"a\"\"[x]\"&A1"), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(ReferenceToken::classify("3"), ReferenceToken::Positional("3"));
        assert_eq!(
            ReferenceToken::classify("Budget.xlsx"),
            ReferenceToken::Named("Budget.xlsx")
        );
        assert_eq!(
            ReferenceToken::classify(r"C:\Reports\Budget.xlsx"),
            ReferenceToken::Named("Budget.xlsx")
        );
        assert_eq!(
            ReferenceToken::classify("/srv/share/Budget.xlsx"),
            ReferenceToken::Named("Budget.xlsx")
        );
        assert_eq!(ReferenceToken::classify("1a"), ReferenceToken::Named("1a"));
    }
}
