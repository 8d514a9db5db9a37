// Terminal capability detection: picks the glyph tier for the grid
use tracing::debug;

/// Environment signals relevant to glyph selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSignals {
    pub rendering_override: Option<String>,
    pub term: Option<String>,
    pub lang: Option<String>,
    pub lc_all: Option<String>,
}

/// Terminals known to render the full Unicode circle set
const MODERN_TERMS: [&str; 7] = [
    "xterm-256color",
    "screen-256color",
    "tmux-256color",
    "alacritty",
    "kitty",
    "iterm",
    "gnome-terminal",
];

/// Terminals that at least handle block/box drawing characters
const EXTENDED_TERMS: [&str; 7] = ["xterm", "screen", "tmux", "ansi", "vt100", "vt102", "vt220"];

/// Glyph tier for the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingTier {
    #[default]
    Minimal,
    Extended,
    Full,
}

/// The four glyphs used for a cell, from no completion to target met
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSet {
    pub none: &'static str,
    pub low: &'static str,
    pub partial: &'static str,
    pub complete: &'static str,
}

const MINIMAL_SET: CharacterSet = CharacterSet {
    none: ".",
    low: "-",
    partial: "+",
    complete: "#",
};

const EXTENDED_SET: CharacterSet = CharacterSet {
    none: "░",
    low: "▒",
    partial: "▓",
    complete: "█",
};

const FULL_SET: CharacterSet = CharacterSet {
    none: "○",
    low: "◐",
    partial: "◑",
    complete: "●",
};

impl RenderingTier {
    pub fn charset(&self) -> &'static CharacterSet {
        match self {
            RenderingTier::Minimal => &MINIMAL_SET,
            RenderingTier::Extended => &EXTENDED_SET,
            RenderingTier::Full => &FULL_SET,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderingTier::Minimal => "Minimal",
            RenderingTier::Extended => "Extended",
            RenderingTier::Full => "Full",
        }
    }

    /// Parse an override value; legacy `ascii`/`unicode` spellings are accepted
    pub fn from_override(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "minimal" | "ascii" => Some(RenderingTier::Minimal),
            "extended" | "ascii-extended" => Some(RenderingTier::Extended),
            "full" | "unicode" => Some(RenderingTier::Full),
            _ => None,
        }
    }
}

fn is_utf8_locale(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.to_lowercase();
        v.contains("utf-8") || v.contains("utf8")
    })
}

/// Pick the rendering tier. Absent or unknown values fall back to `Minimal`.
pub fn detect(signals: &EnvSignals) -> RenderingTier {
    if let Some(value) = signals.rendering_override.as_deref() {
        match RenderingTier::from_override(value) {
            Some(tier) => {
                debug!("Rendering tier overridden to {}", tier.name());
                return tier;
            }
            None => debug!("Ignoring unknown rendering override '{}'", value),
        }
    }

    let term = signals.term.as_deref().unwrap_or_default().to_lowercase();
    let utf8 = is_utf8_locale(signals.lang.as_deref()) || is_utf8_locale(signals.lc_all.as_deref());

    let tier = if utf8 && MODERN_TERMS.iter().any(|t| term.contains(t)) {
        RenderingTier::Full
    } else if EXTENDED_TERMS.iter().any(|t| term.contains(t)) {
        RenderingTier::Extended
    } else {
        RenderingTier::Minimal
    };

    debug!(term = %term, utf8, "Detected rendering tier {}", tier.name());
    tier
}
