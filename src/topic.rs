//! Per-option topic rendering (spec.md §6 "Topic format").
//!
//! Each configured stanza is rendered independently by substituting
//! `$S $Y $M $D $C $I $F $X` and the stanzas are joined with the
//! configured delimiter. Worked example (spec.md §6): template
//! `OPRA.$S.$Y$M$D$C$I$F.$X` with key `(ABCDE, 10, 5, 10, C, 12345, 123,
//! Q)` renders `OPRA.ABCDE.100510C12345123.Q`.

use crate::config::TopicFormat;
use crate::table::key::OptionKey;

/// Renders `key`'s topic string per `fmt`. `fmt` must already have
/// passed [`TopicFormat::validate`]; an unrecognized `$`-variable here
/// is left untouched rather than panicking, since validation is the
/// sole gate (spec.md §7 "Fatal... there is no partial-startup mode").
pub fn render_topic(fmt: &TopicFormat, key: &OptionKey) -> String {
    let mut stanzas = Vec::with_capacity(fmt.stanzas.len());
    for stanza in &fmt.stanzas {
        stanzas.push(render_stanza(stanza, key));
    }
    stanzas.join(&fmt.stanza_delim.to_string())
}

fn render_stanza(stanza: &str, key: &OptionKey) -> String {
    let mut out = String::with_capacity(stanza.len());
    let mut chars = stanza.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('S') => out.push_str(key.root_str()),
            Some('Y') => out.push_str(&format!("{:02}", key.exp_year)),
            Some('M') => out.push_str(&format!("{:02}", key.exp_month)),
            Some('D') => out.push_str(&format!("{:02}", key.exp_day)),
            Some('C') => out.push(key.put_call as char),
            Some('I') => out.push_str(&key.strike_decimal.to_string()),
            Some('F') => out.push_str(&key.strike_fraction.to_string()),
            Some('X') => out.push(key.exchange as char),
            Some(other) => {
                out.push('$');
                out.push(other);
            }
            None => out.push('$'),
        }
    }
    out
}
