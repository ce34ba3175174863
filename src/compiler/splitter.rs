//! Splits raw words from the lexer into identifier, number, and operator
//! tokens.

const THREE_CHAR_OPERATORS: &[&str] = &["<<=", ">>="];

const TWO_CHAR_OPERATORS: &[&str] = &[
    "+=", "++", "-=", "--", "->", ":=", "::", "<=", "<<", ">=", ">>", "==", "=>", "!=", "^=",
    "&=", "&&", "|=", "||", "##", "*=", "/=", "%=",
];

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// `true` if `text` is a plain decimal number so far: digits with at most one
/// `.`, and at least one digit.
fn is_decimal_number(text: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in text.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// `true` if `pending` is a decimal mantissa followed by an exponent marker,
/// like `1e` or `2.5E`.
fn is_exponent_prefix(pending: &str) -> bool {
    match pending.strip_suffix(['e', 'E']) {
        Some(mantissa) => is_decimal_number(mantissa),
        None => false,
    }
}

/// Split one raw word into tokens: word characters stay together, operators
/// are taken longest match first, and the operator-run repair is applied.
pub fn split_word(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut tokens = Vec::new();
    let mut pending = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if is_word_char(c) {
            pending.push(c);
            i += 1;
            continue;
        }

        match c {
            '.' if next.is_some_and(|n| n.is_ascii_digit()) || is_decimal_number(&pending) => {
                pending.push(c);
                i += 1;
                continue;
            }
            '+' | '-' if next.is_some_and(|n| n.is_ascii_digit()) && is_exponent_prefix(&pending) => {
                pending.push(c);
                i += 1;
                continue;
            }
            '#' if pending.is_empty() && next.is_some_and(|n| n.is_ascii_alphabetic()) => {
                pending.push(c);
                i += 1;
                continue;
            }
            _ => {}
        }

        if !pending.is_empty() {
            tokens.push(std::mem::take(&mut pending));
        }

        let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
        let width = if THREE_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op)) {
            3
        } else if TWO_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op)) {
            2
        } else {
            1
        };
        tokens.push(chars[i..i + width].iter().collect());
        i += width;
    }

    if !pending.is_empty() {
        tokens.push(pending);
    }
    disambiguate_runs(tokens)
}

/// Operator-run repair. Greedy splitting turns `++++` into `++ ++`; the
/// language reads such runs by fixed tables instead.
fn run_table(op: char, len: usize) -> Option<Vec<String>> {
    let single = op.to_string();
    let double = format!("{op}{op}");
    match len {
        3 => Some(vec![double, single]),
        4 => Some(vec![double, single.clone(), single]),
        5 => Some(vec![double.clone(), single, double]),
        _ => None,
    }
}

fn run_char(token: &str) -> Option<char> {
    let first = token.chars().next()?;
    if (first == '+' || first == '-') && token.chars().all(|c| c == first) {
        Some(first)
    } else {
        None
    }
}

pub fn disambiguate_runs(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let Some(op) = run_char(&tokens[i]) else {
            out.push(tokens[i].clone());
            i += 1;
            continue;
        };
        let mut end = i;
        let mut len = 0;
        while end < tokens.len() && run_char(&tokens[end]) == Some(op) {
            len += tokens[end].len();
            end += 1;
        }
        match run_table(op, len) {
            Some(replacement) => out.extend(replacement),
            None => out.extend(tokens[i..end].iter().cloned()),
        }
        i = end;
    }
    out
}
