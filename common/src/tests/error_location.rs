use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation` renders as `[file:line:column]`.
///
/// **WHY THIS MATTERS**: Every engine error embeds this rendering in its Display output.
/// Log readers rely on the bracketed form to jump to the failing call site.
///
/// **BUG THIS CATCHES**: Would catch if the Display format drifts (missing brackets,
/// swapped line/column) and breaks every error message in the workspace.
#[test]
#[track_caller]
fn given_caller_location_when_displayed_then_renders_bracketed_position() {
    // GIVEN: A location captured at this call site
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Rendering it
    let rendered = location.to_string();

    // THEN: Should be [file:line:column]
    assert!(rendered.starts_with('['));
    assert!(rendered.ends_with(']'));
    assert!(rendered.contains(location.file));
    assert!(rendered.contains(&format!(":{}:{}", location.line, location.column)));
}
