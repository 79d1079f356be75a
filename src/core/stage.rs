use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed update phase of a formatoption.
///
/// Stages run in declaration order: data-transformation options first, then
/// plotting options, then labeling options. The derived `Ord` encodes that
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpdateStage {
    /// Applied before the plot data is assembled (e.g. region selection).
    Data,
    /// Applied while the plot is made (e.g. colormaps, plot styles).
    Plotting,
    /// Applied at the end; changes here only require a label refresh.
    Labeling,
}

impl UpdateStage {
    /// True when a change at this stage forces a full replot.
    #[must_use]
    pub const fn requires_replot(self) -> bool {
        !matches!(self, Self::Labeling)
    }
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Data => "data",
            Self::Plotting => "plotting",
            Self::Labeling => "labeling",
        };
        f.write_str(name)
    }
}
