//! Ownership prefixes on item names.
//!
//! A name such as `GEO-Subdivide` is owned by the task layer whose prefix is the
//! part before the first delimiter. Items whose prefix is not a known layer prefix
//! are unclaimed.

/// Separates the owner prefix from the rest of a name.
pub const NAME_DELIMITER: char = '-';

/// Prefix of stack entries that are applied after a push; synced by every layer
/// that touches the stack.
pub const APPLY_AFTER_PUSH: &str = "APL";

/// Text before the first delimiter, if the name has one.
#[must_use]
pub fn owner_prefix(name: &str) -> Option<&str> {
    name.split_once(NAME_DELIMITER).map(|(prefix, _)| prefix)
}

/// Whether `name` carries one of `prefixes`.
#[must_use]
pub fn is_owned_by<S: AsRef<str>>(name: &str, prefixes: &[S]) -> bool {
    owner_prefix(name).is_some_and(|owner| prefixes.iter().any(|p| p.as_ref() == owner))
}

/// `name` with `prefix` prepended, unless it already carries a known prefix.
#[must_use]
pub fn prefixed_name<S: AsRef<str>>(name: &str, prefix: &str, known: &[S]) -> String {
    if is_owned_by(name, known) {
        return name.to_string();
    }
    format!("{prefix}{NAME_DELIMITER}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [&str; 5] = ["RIG", "GEO", "APL", "GRM", "SH"];

    #[test]
    fn owner_is_text_before_first_delimiter() {
        assert_eq!(owner_prefix("GEO-Sub-divide"), Some("GEO"));
        assert_eq!(owner_prefix("Subdivide"), None);
        assert!(is_owned_by("RIG-Armature", &["RIG"]));
        assert!(!is_owned_by("RIGArmature", &["RIG"]));
        assert!(!is_owned_by("FOO-Armature", &KNOWN));
    }

    #[test]
    fn prefixing_keeps_existing_claims() {
        assert_eq!(prefixed_name("Smooth", "GEO", &KNOWN), "GEO-Smooth");
        assert_eq!(prefixed_name("SH-Smooth", "GEO", &KNOWN), "SH-Smooth");
        assert_eq!(prefixed_name("X-Smooth", "GEO", &KNOWN), "GEO-X-Smooth");
    }
}
