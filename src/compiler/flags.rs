//! Dialect/extension flags and the `//#!` directive comments that select them.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Which dialect constants, functions, and keywords a compile unit can see.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AcceptedFlags: u32 {
        /// The base scripting language.
        const LSL    = 1 << 0;
        /// OpenSimulator `os*` extensions.
        const OSSL   = 1 << 1;
        /// Aurora/WhiteCore `aa*` extensions.
        const AURORA = 1 << 2;
        /// Set by `//#!Mode:assl`. Reserved: no table entry is gated on it
        /// yet, so ASSL scripts see the Aurora names.
        const ASSL   = 1 << 3;
        /// Administrative functions, enabled per script.
        const ADMIN  = 1 << 4;
    }
}

impl AcceptedFlags {
    /// Baseline used when no `Mode:` directive is recognized.
    pub const DEFAULT_BASELINE: AcceptedFlags = AcceptedFlags::LSL
        .union(AcceptedFlags::OSSL)
        .union(AcceptedFlags::AURORA);

    /// Baseline flags for a `//#!Mode:<name>` value. Case-insensitive and trimmed.
    pub fn for_mode(name: &str) -> Option<AcceptedFlags> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lsl" => Some(AcceptedFlags::LSL),
            "aurora" | "whitecore" => Some(AcceptedFlags::DEFAULT_BASELINE),
            "assl" => Some(AcceptedFlags::DEFAULT_BASELINE | AcceptedFlags::ASSL),
            _ => None,
        }
    }

    /// Extension flag for a `//#!Enable:<name>` value.
    pub fn for_extension(name: &str) -> Option<AcceptedFlags> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(AcceptedFlags::ADMIN),
            _ => None,
        }
    }

    /// `true` if something introduced by `flag` is visible under these flags.
    pub fn accepts(self, flag: AcceptedFlags) -> bool {
        self.intersects(flag)
    }
}

/// Mode and extension selections read from the leading comment block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directives {
    pub mode: Option<AcceptedFlags>,
    pub enabled: AcceptedFlags,
}

const DIRECTIVE_PREFIX: &str = "//#!";

impl Directives {
    /// Scan the leading comment lines of `source` for `//#!Mode:` and
    /// `//#!Enable:` directives. Scanning stops at the first line that is
    /// neither blank nor a `//` comment.
    pub fn parse(source: &str) -> Self {
        let mut directives = Directives::default();
        for raw in source.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with("//") {
                break;
            }
            let Some(body) = line.strip_prefix(DIRECTIVE_PREFIX) else {
                continue;
            };
            let Some((key, value)) = body.split_once(':') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "mode" => {
                    if let Some(flags) = AcceptedFlags::for_mode(value) {
                        directives.mode = Some(directives.mode.unwrap_or(AcceptedFlags::empty()) | flags);
                    } else {
                        tracing::debug!(mode = value.trim(), "ignoring unrecognized mode directive");
                    }
                }
                "enable" => {
                    if let Some(flag) = AcceptedFlags::for_extension(value) {
                        directives.enabled |= flag;
                    } else {
                        tracing::debug!(extension = value.trim(), "ignoring unrecognized extension");
                    }
                }
                _ => {}
            }
        }
        directives
    }

    /// Combine with the configured baseline into the unit's accepted flags.
    pub fn accepted_flags(self, default_baseline: AcceptedFlags) -> AcceptedFlags {
        self.mode.unwrap_or(default_baseline) | self.enabled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn no_directives_uses_default() {
        let d = Directives::parse("default { state_entry() {} }");
        assert_eq!(d.accepted_flags(AcceptedFlags::DEFAULT_BASELINE), AcceptedFlags::DEFAULT_BASELINE);
    }

    #[test]
    fn mode_lsl_restricts() {
        let d = Directives::parse("//#!Mode: LSL \ndefault {}");
        assert_eq!(d.accepted_flags(AcceptedFlags::DEFAULT_BASELINE), AcceptedFlags::LSL);
    }

    #[test]
    fn whitecore_is_aurora() {
        let d = Directives::parse("//#!Mode:whitecore");
        assert_eq!(d.mode, Some(AcceptedFlags::DEFAULT_BASELINE));
    }

    #[test]
    fn unknown_mode_keeps_default() {
        let d = Directives::parse("//#!Mode:python\n");
        assert_eq!(d.mode, None);
        assert_eq!(d.accepted_flags(AcceptedFlags::LSL), AcceptedFlags::LSL);
    }

    #[test]
    fn enable_admin_adds_flag() {
        let d = Directives::parse("//#!Mode:lsl\n//#!Enable:admin\n");
        assert_eq!(
            d.accepted_flags(AcceptedFlags::DEFAULT_BASELINE),
            AcceptedFlags::LSL | AcceptedFlags::ADMIN
        );
    }

    #[test]
    fn modes_combine() {
        let d = Directives::parse("//#!Mode:lsl\n//#!Mode:assl\n");
        assert!(d.mode.unwrap().contains(AcceptedFlags::ASSL | AcceptedFlags::LSL));
    }

    #[test]
    fn directives_after_code_are_ignored() {
        let d = Directives::parse("integer x;\n//#!Enable:admin\n");
        assert!(d.enabled.is_empty());
    }

    #[test]
    fn plain_comments_are_skipped() {
        let d = Directives::parse("// door script\n\n//#!Enable:admin\n");
        assert_eq!(d.enabled, AcceptedFlags::ADMIN);
    }
}
