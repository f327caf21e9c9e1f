//! Character substitutions for the standard Type1 fonts.

/// Replaces typographic characters the WinAnsi fonts cannot show and drops
/// pictographic emoji. Every replacement is plain ASCII, so the function is
/// idempotent.
pub fn sanitize_for_win_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2190}' | '\u{2192}' | '\u{27A1}' => out.push_str("->"),
            '\u{2022}' | '\u{25CF}' => out.push('*'),
            '\u{00A0}' => out.push(' '),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            c if is_emoji(c) => {}
            c => out.push(c),
        }
    }
    out
}

fn is_emoji(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c)
}
