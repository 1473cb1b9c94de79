//! Arithmetic expression tokenizer.
//!
//! Accepts only what a calculator command needs: numbers, operators,
//! grouping, argument separators and a closed set of function and constant
//! names. Anything else is rejected before the expression reaches an
//! evaluator.

const FUNCTIONS: &[&str] = &["sqrt", "sin", "cos", "tan", "log", "ln", "abs"];
const CONSTANTS: &[&str] = &["pi", "e"];
const OPERATORS: &[char] = &['+', '-', '*', '/', '^', '%', '×', '÷'];

#[derive(Debug, Clone, PartialEq)]
pub enum MathToken {
    Number(String),
    Operator(char),
    Open(char),
    Close(char),
    Separator,
    Function(&'static str),
    Constant(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("unknown identifier {0:?}")]
    UnknownIdentifier(String),
    #[error("unbalanced brackets")]
    Unbalanced,
}

fn closing_for(open: char) -> char {
    if open == '(' {
        ')'
    } else {
        ']'
    }
}

fn identifier(word: &str) -> Result<MathToken, MathError> {
    let lower = word.to_ascii_lowercase();
    if lower == "x" {
        // Written multiplication sign.
        return Ok(MathToken::Operator('*'));
    }
    if let Some(f) = FUNCTIONS.iter().copied().find(|f| *f == lower) {
        return Ok(MathToken::Function(f));
    }
    if let Some(c) = CONSTANTS.iter().copied().find(|c| *c == lower) {
        return Ok(MathToken::Constant(c));
    }
    Err(MathError::UnknownIdentifier(word.to_string()))
}

/// Split `expr` into tokens, rejecting anything outside the calculator grammar.
pub fn tokenize(expr: &str) -> Result<Vec<MathToken>, MathError> {
    let mut tokens = Vec::new();
    let mut stack = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
        } else if ch.is_ascii_digit() || ch == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            tokens.push(MathToken::Number(chars[start..i].iter().collect()));
        } else if ch.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(identifier(&word)?);
        } else if OPERATORS.contains(&ch) {
            tokens.push(MathToken::Operator(ch));
            i += 1;
        } else if ch == '(' || ch == '[' {
            stack.push(ch);
            tokens.push(MathToken::Open(ch));
            i += 1;
        } else if ch == ')' || ch == ']' {
            match stack.pop() {
                Some(open) if closing_for(open) == ch => {}
                _ => return Err(MathError::Unbalanced),
            }
            tokens.push(MathToken::Close(ch));
            i += 1;
        } else if ch == ',' {
            tokens.push(MathToken::Separator);
            i += 1;
        } else {
            return Err(MathError::UnexpectedChar { ch, position: i });
        }
    }

    if !stack.is_empty() {
        return Err(MathError::Unbalanced);
    }
    if tokens.is_empty() {
        return Err(MathError::Empty);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_calculator_input() {
        assert!(tokenize("2+2").is_ok());
        assert!(tokenize("sqrt(16) * [3 - 1]").is_ok());
        assert!(tokenize("2 x 3").is_ok());
        assert!(tokenize("sin(pi / 2) + log(100, 10)").is_ok());
        assert!(tokenize("10 % 3 ^ 2").is_ok());
    }

    #[test]
    fn test_token_shapes() {
        assert_eq!(
            tokenize("3x(pi)").unwrap(),
            vec![
                MathToken::Number("3".into()),
                MathToken::Operator('*'),
                MathToken::Open('('),
                MathToken::Constant("pi"),
                MathToken::Close(')'),
            ]
        );
    }

    #[test]
    fn test_rejects_identifiers_outside_whitelist() {
        assert_eq!(
            tokenize("exit()"),
            Err(MathError::UnknownIdentifier("exit".into()))
        );
        // Letters that individually appear in function names do not form a word.
        assert!(tokenize("pie").is_err());
        assert!(tokenize("cat").is_err());
    }

    #[test]
    fn test_rejects_structure_and_characters() {
        assert_eq!(tokenize(""), Err(MathError::Empty));
        assert_eq!(tokenize("   "), Err(MathError::Empty));
        assert_eq!(tokenize("(1+2"), Err(MathError::Unbalanced));
        assert_eq!(tokenize("(1+2]"), Err(MathError::Unbalanced));
        assert_eq!(
            tokenize("1;2"),
            Err(MathError::UnexpectedChar { ch: ';', position: 1 })
        );
    }
}
