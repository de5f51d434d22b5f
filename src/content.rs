//! Rendering of the managed resolv.conf.

use crate::merge::MergedOutput;
use std::fmt::Write as _;
use std::path::Path;

/// Renders the managed file.
///
/// ```text
/// # Generated by NetBird
/// # If needed you can restore the original file by copying back /etc/resolv.conf.original.netbird
///
/// options ndots:2
/// search corp.example old.example
/// nameserver 100.64.0.1
/// nameserver 8.8.8.8
/// ```
#[must_use]
pub fn render(tool_name: &str, backup_path: &Path, merged: &MergedOutput) -> String {
    let mut buf = format!(
        "# Generated by {tool_name}\n\
         # If needed you can restore the original file by copying back {}\n\n",
        backup_path.display()
    );

    for line in &merged.other_lines {
        buf.push_str(line);
        buf.push('\n');
    }

    if !merged.search_domains.is_empty() {
        let _ = writeln!(buf, "search {}", merged.search_domains.join(" "));
    }

    for ns in &merged.name_servers {
        let _ = writeln!(buf, "nameserver {ns}");
    }

    buf
}
