//! Managed section content

use crate::catalog::{Catalog, GroupKind};
use crate::layout::InstallTarget;

/// Header line that starts the tool-owned part of the shared document.
pub const MARKER: &str = "# mine: managed instructions (do not edit below this line)";

/// Render the managed section for `catalog` installed at `target`.
///
/// The output starts with [`MARKER`] and is fully determined by its inputs.
pub fn render_managed(catalog: &Catalog, target: &InstallTarget) -> String {
    let mut out = String::new();
    out.push_str(MARKER);
    out.push('\n');
    out.push_str(&format!("<!-- mine version {} -->\n\n", catalog.version()));
    out.push_str("Follow the mine workflows and skills installed on this machine.\n\n");

    out.push_str("## Locations\n\n");
    for kind in GroupKind::ALL {
        out.push_str(&format!(
            "- {}: `{}`\n",
            kind.as_str(),
            target.group_root(kind)
        ));
    }
    out.push_str(&format!("- preferences: `{}`\n", target.preferences()));

    let bundles = catalog.bundles();
    if !bundles.is_empty() {
        out.push_str("\n## Skills\n\n");
        for bundle in bundles {
            out.push_str(&format!(
                "- {bundle}: `{}`\n",
                target.bundle_root(bundle).join("SKILL.md")
            ));
        }
    }

    out.push_str("\nRe-run `mine install` instead of editing this section by hand.\n");
    out
}
