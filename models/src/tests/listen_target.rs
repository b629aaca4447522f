use crate::ListenTarget;

/// **VALUE**: Verifies the accessors expose exactly one of port / pipe path.
///
/// **WHY THIS MATTERS**: The payload builder and logs rely on these accessors to decide
/// which frontend fields to populate.
///
/// **BUG THIS CATCHES**: Would catch an accessor returning data for the wrong variant.
#[test]
fn given_each_target_shape_when_accessed_then_only_matching_field_is_present() {
    // GIVEN: One target of each shape
    let tcp = ListenTarget::tcp("0.0.0.0", 3000);
    let pipe = ListenTarget::pipe(r"\\.\pipe\engine");

    // THEN: Accessors reflect the variant
    assert_eq!(tcp.port(), Some(3000));
    assert_eq!(tcp.pipe_path(), None);
    assert_eq!(pipe.port(), None);
    assert_eq!(pipe.pipe_path(), Some(r"\\.\pipe\engine"));
}

/// **VALUE**: Verifies the Display form used in log lines.
///
/// **WHY THIS MATTERS**: Operators grep logs for "tcp host:port" when a proxy fails to come up.
///
/// **BUG THIS CATCHES**: Would catch a Display impl that prints Debug output instead.
#[test]
fn given_targets_when_displayed_then_render_kind_and_location() {
    assert_eq!(ListenTarget::tcp("0.0.0.0", 3000).to_string(), "tcp 0.0.0.0:3000");
    assert_eq!(
        ListenTarget::pipe(r"\\.\pipe\engine").to_string(),
        r"pipe \\.\pipe\engine"
    );
}
