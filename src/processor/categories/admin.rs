//! Category `C` — administrative messages (spec.md §4.4 table): "routed
//! to publisher". No arbiter interaction (spec.md §4.3: administrative
//! category `C` never touches the sliding window).

use crate::processor::records::AdminPayload;

pub fn apply(body: &str) -> AdminPayload {
    AdminPayload { body: body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_is_surfaced_verbatim() {
        let payload = apply("LINE INTEGRITY OK");
        assert_eq!(payload.body, "LINE INTEGRITY OK");
    }
}
