//! Effect evaluation errors.

/// Why an effect could not be applied to a glyph.
///
/// The renderer logs these and moves on; they never abort a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// A gradient was built by hand with no color stops.
    EmptyGradient,
    /// A parameter or frame input was NaN or infinite.
    NonFiniteParameter {
        effect: &'static str,
        param: &'static str,
    },
    /// A track's character table does not cover the glyph being evaluated.
    TrackMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for EffectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGradient => write!(f, "gradient has no color stops"),
            Self::NonFiniteParameter { effect, param } => {
                write!(f, "{effect}: parameter {param} is not finite")
            }
            Self::TrackMismatch { expected, found } => write!(
                f,
                "track covers {expected} characters but index {found} was requested"
            ),
        }
    }
}

impl std::error::Error for EffectError {}
