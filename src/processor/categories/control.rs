//! Category `H` — control messages (spec.md §4.4 table): "routed to
//! arbiter; body text surfaced to publisher". The arbiter routing itself
//! lives in [`crate::arbiter::control_kind_for`]; this module only builds
//! the pass-through publisher payload.

use crate::processor::records::ControlPayload;

pub fn apply(body: &str) -> ControlPayload {
    ControlPayload { body: body.to_string() }
}
