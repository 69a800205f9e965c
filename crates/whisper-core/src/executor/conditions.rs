//! English comparison words in `when`, question and `while` conditions.

/// `is` directly in front of another comparison word adds nothing:
/// `x is less than 4` means `x less than 4`.
const REDUNDANT_IS: &[(&str, &str)] = &[
    (" is greater than ", " greater than "),
    (" is less than ", " less than "),
    (" is bigger than ", " bigger than "),
    (" is smaller than ", " smaller than "),
    (" is not ", " not "),
];

/// Applied in order, as plain text replacement
const OPERATOR_WORDS: &[(&str, &str)] = &[
    (" is ", " == "),
    (" equals ", " == "),
    (" greater than ", " > "),
    (" less than ", " < "),
    (" bigger than ", " > "),
    (" smaller than ", " < "),
    (" not ", " != "),
];

/// Rewrite operator words into expression operators
pub fn rewrite(condition: &str) -> String {
    REDUNDANT_IS
        .iter()
        .chain(OPERATOR_WORDS)
        .fold(condition.to_string(), |text, (word, operator)| {
            text.replace(word, operator)
        })
}
