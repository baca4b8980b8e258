pub mod loader;
pub mod row;

pub use loader::{load_baseline, read_baseline};
pub use row::{BaselineRow, ColumnValue, Phase};

use std::collections::BTreeSet;

/// Immutable snapshot of the baseline CSV
#[derive(Debug, Clone, Default)]
pub struct BaselineTable {
    pub rows: Vec<BaselineRow>,
}

/// Row chosen for a chip, with the number of rows that matched
#[derive(Debug, Clone, Copy)]
pub struct RowMatch<'a> {
    pub row: &'a BaselineRow,
    pub matches: usize,
}

impl RowMatch<'_> {
    /// Warning text when the chip appears on more than one row
    pub fn duplicate_warning(&self) -> Option<String> {
        (self.matches > 1).then(|| {
            format!(
                "chip '{}' has {} rows; using the first row",
                self.row.chip, self.matches
            )
        })
    }
}

impl BaselineTable {
    /// Distinct non-empty chip names, sorted
    pub fn chip_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| !row.chip.is_empty())
            .map(|row| row.chip.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First row whose chip matches exactly
    pub fn select(&self, chip: &str) -> Option<RowMatch<'_>> {
        let mut matching = self.rows.iter().filter(|row| row.chip == chip);
        let row = matching.next()?;
        Some(RowMatch {
            row,
            matches: 1 + matching.count(),
        })
    }
}
