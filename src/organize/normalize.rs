use once_cell::sync::Lazy;
use regex::Regex;

/// One class of noise that may appear at the current position of a stem.
///
/// The pattern has a `tok` group holding the text to remove; anything matched
/// after the group is a guard that must be present but stays in the stem.
pub struct NoiseToken {
    pub name: &'static str,
    /// Track numbering proper. A pass removes nothing unless one of these matched.
    pub numbering: bool,
    pattern: Regex,
}

impl NoiseToken {
    fn new(name: &'static str, pattern: &str) -> Self {
        let pattern = Regex::new(&format!("(?i)^(?:{})", pattern))
            .unwrap_or_else(|e| panic!("noise token '{}' does not compile: {}", name, e));
        Self {
            name,
            numbering: false,
            pattern,
        }
    }

    fn numbering(name: &'static str, pattern: &str) -> Self {
        Self {
            numbering: true,
            ..Self::new(name, pattern)
        }
    }

    /// Number of bytes this token removes from the start of `rest`
    pub fn match_len(&self, rest: &str) -> usize {
        self.pattern
            .captures(rest)
            .and_then(|caps| caps.name("tok"))
            .map_or(0, |m| m.end())
    }
}

/// Noise token classes, tried left to right. Each one is optional.
pub static NOISE_TOKENS: Lazy<Vec<NoiseToken>> = Lazy::new(|| {
    vec![
        NoiseToken::new("open_bracket", r"(?P<tok>[【「])"),
        NoiseToken::numbering(
            "track_prefix",
            r"(?P<tok>track|trck|tr|ＴＲ|rj\d{1,8})(?:ex|sp)?[ _#\-]*(?:\d|ex|sp|トラック)",
        ),
        NoiseToken::numbering("extra_marker", r"(?P<tok>ex|sp)(?:[^a-z]|$)"),
        NoiseToken::new("dash_separator", r"(?P<tok> ?-? ?)"),
        NoiseToken::numbering("track_number", r"(?P<tok>\d{1,3})(?:\D|$)"),
        NoiseToken::new("number_separator", r"(?P<tok>[_# ])"),
        NoiseToken::new("track_word", r"(?P<tok>トラック)"),
        NoiseToken::numbering("sub_number", r"(?P<tok>\d{1,2}|ex|sp)(?:[^\da-z]|$)"),
        NoiseToken::new("side_suffix", r"(?P<tok>-a|-b)(?:[^a-z]|$)"),
        NoiseToken::new("trailing_separator", r"(?P<tok>[_. ])"),
        NoiseToken::new("close_bracket", r"(?P<tok>[】\]」])"),
        NoiseToken::new("close_bracket_extra", r"(?P<tok>」)"),
        NoiseToken::new("supplementary_track", r"(?P<tok>(?:track|tr)(?:sp|ex|\d{1,2}))(?:\D|$)"),
        NoiseToken::new("supplementary_separator", r"(?P<tok>[_ ])"),
        NoiseToken::new("voice_marker", r"(?P<tok>n|hi|el|h|mr) ?\d"),
        NoiseToken::new("voice_number", r"(?P<tok> ?\d{1,2} ?)(?:\D|$)"),
        NoiseToken::new("take_marker", r"(?P<tok>r)[_\-]?\d"),
        NoiseToken::new("take_separator", r"(?P<tok>[_\-])"),
        NoiseToken::new("take_number", r"(?P<tok>tr\d{1,2}|\d{1,2})(?:\D|$)"),
        NoiseToken::new("underscore", r"(?P<tok>_)"),
        NoiseToken::new("bracketed_track", r"(?P<tok>【trck\d{1,2}】)"),
    ]
});

/// One pass of the rule list followed by a whitespace trim.
///
/// All or nothing: when no numbering token matched, only the trim applies.
fn strip_noise_once(stem: &str) -> String {
    let mut pos = 0;
    let mut numbered = false;
    for token in NOISE_TOKENS.iter() {
        let len = token.match_len(&stem[pos..]);
        numbered |= token.numbering && len > 0;
        pos += len;
    }

    let rest = if numbered { &stem[pos..] } else { stem };
    rest.trim().to_string()
}

/// Remove track numbering noise from a filename stem.
///
/// The rule list is applied until the stem stops changing, so the result is a
/// fixed point. A stem made only of noise becomes empty.
pub fn normalize_stem(stem: &str) -> String {
    let mut current = strip_noise_once(stem);
    loop {
        let next = strip_noise_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
