//! Error types for the rules layer.

/// A rejected move. Both variants are recoverable: the board is left
/// unchanged and the caller reports the rejection to the offending client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The column index is outside `0..COLS`.
    #[error("invalid column {0}")]
    InvalidColumn(usize),

    /// Every cell of the column is already occupied.
    #[error("column {0} is full")]
    ColumnFull(usize),
}
