//! Line diff for expected/actual renderings in failure diagnostics.

/// Render a line-oriented diff between expected and actual text.
///
/// Lines present on only one side are reported as pure additions/removals.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let longest = expected_lines.len().max(actual_lines.len());

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    for i in 0..longest {
        let e = expected_lines.get(i);
        let a = actual_lines.get(i);
        if e == a {
            continue;
        }
        out.push_str(&format!("@@ line {} @@\n", i + 1));
        if let Some(e) = e {
            out.push_str(&format!("-{e}\n"));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{a}\n"));
        }
    }
    out
}

/// True when either rendering spans more than one line.
#[must_use]
pub fn wants_diff(expected: &str, actual: &str) -> bool {
    expected.contains('\n') || actual.contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_render_marker() {
        assert_eq!(render_diff("a\nb", "a\nb"), "[identical]");
    }

    #[test]
    fn changed_line_is_reported_with_position() {
        let diff = render_diff("a\nb\nc", "a\nB\nc");
        assert!(diff.contains("@@ line 2 @@"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+B\n"));
        assert!(!diff.contains("line 1"));
    }

    #[test]
    fn extra_actual_lines_are_additions() {
        let diff = render_diff("a", "a\nextra");
        assert!(diff.contains("@@ line 2 @@\n+extra\n"));
    }

    #[test]
    fn multiline_detection() {
        assert!(!wants_diff("1", "2"));
        assert!(wants_diff("Item {\n}", "x"));
    }
}
