/// Minimal column contract the pipeline needs: a stable field identity and a
/// hidden flag. Everything else about columns (widths, headers, formatters)
/// belongs to the rendering collaborator.
pub trait GridColumn {
    /// Stable field identity, used to detect whether a plugin's
    /// `process_columns` output modified the input or replaced it wholesale.
    fn key(&self) -> &str;

    /// Hidden columns are excluded from the plugin chain and re-appended
    /// unchanged after it.
    fn hidden(&self) -> bool;
}

/// Result of running the `process_columns` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnsOutcome<C> {
    /// The chain modified the visible columns; hidden columns were
    /// re-appended unchanged.
    Merged(Vec<C>),
    /// The chain's output shares no field identity with the input (e.g. a
    /// pivot transform). The output stands alone; no per-field merging is
    /// attempted and hidden columns are not re-appended.
    Replaced(Vec<C>),
}

impl<C> ColumnsOutcome<C> {
    pub fn columns(&self) -> &[C] {
        match self {
            Self::Merged(c) | Self::Replaced(c) => c,
        }
    }

    pub fn into_columns(self) -> Vec<C> {
        match self {
            Self::Merged(c) | Self::Replaced(c) => c,
        }
    }

    pub fn is_replacement(&self) -> bool {
        matches!(self, Self::Replaced(_))
    }
}
