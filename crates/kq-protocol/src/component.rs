//! Known logical components of the monitored application.
//!
//! Each component runs as a deployment carrying `component=<name>` as a
//! label; the dispatcher resolves components through that label.

/// Fixed component vocabulary, in the order shown to users.
pub const COMPONENT_VOCABULARY: &[&str] = &[
    "core",
    "database",
    "jobservice",
    "portal",
    "redis",
    "registry",
    "trivy",
];

/// Vendor prefix users and classifiers tend to put in front of component names.
pub const VENDOR_PREFIX: &str = "harbor-";

/// Label key whose value names the component a deployment belongs to.
pub const COMPONENT_LABEL: &str = "component";

/// Case-insensitive membership test. Expects an already-normalized name.
pub fn is_known_component(name: &str) -> bool {
    COMPONENT_VOCABULARY
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

/// Comma-separated vocabulary for user-facing messages.
pub fn vocabulary_list() -> String {
    COMPONENT_VOCABULARY.join(", ")
}

/// Lower-case, trim, and strip every leading [`VENDOR_PREFIX`].
///
/// Stripping repeats until the prefix is gone so the function is idempotent
/// (`harbor-harbor-core` → `core`, and `core` stays `core`).
pub fn normalize_component(raw: &str) -> String {
    let mut name = raw.trim().to_ascii_lowercase();
    while let Some(rest) = name.strip_prefix(VENDOR_PREFIX) {
        name = rest.trim().to_string();
    }
    name
}
