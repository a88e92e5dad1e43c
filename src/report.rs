//! Rendering of the skip list as a CMake fragment.

/// CMake variable consumed by the release build.
pub const SKIP_LIST_VARIABLE: &str = "TARGET_RELEASE_SKIP_LIST";

const BANNER_WIDTH: usize = 50;

/// Renders a CMake `set()` call with one quoted entry per line.
///
/// ```
/// use am32_release_skip::report::render_cmake_set;
/// let block = render_cmake_set("SKIP", &["a.hex".to_string()]);
/// assert_eq!(block, "set(SKIP\n    \"a.hex\"\n)\n");
/// ```
pub fn render_cmake_set(variable: &str, entries: &[String]) -> String {
    let mut out = format!("set({variable}\n");
    for entry in entries {
        out.push_str(&format!("    \"{entry}\"\n"));
    }
    out.push_str(")\n");
    out
}

/// Renders the full report: banners with the entry count around the
/// `TARGET_RELEASE_SKIP_LIST` block.
pub fn render_report(entries: &[String]) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    format!(
        "\n{banner}\nGENERATED SKIP LIST ({} items)\n{banner}\n{}{banner}\n",
        entries.len(),
        render_cmake_set(SKIP_LIST_VARIABLE, entries)
    )
}
