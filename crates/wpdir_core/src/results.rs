//! Sortable, paginated view over a completed job's summary rows.

use std::cmp::Ordering;

pub const PAGE_SIZE: usize = 100;

/// One matched plugin or theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub slug: String,
    pub name: Option<String>,
    pub active_installs: Option<u64>,
    pub matches: u64,
}

impl SummaryRow {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.slug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    ActiveInstalls,
    Matches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// One-shot "collapse every row" command.
///
/// Each sort produces a signal with a higher generation. A row consumes a
/// given generation once, so handing the same signal down again on an
/// unrelated re-render does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CollapseSignal {
    generation: u64,
}

impl CollapseSignal {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    /// Rows in the order the server returned them.
    rows: Vec<SummaryRow>,
    /// Indices into `rows`, in display order.
    order: Vec<usize>,
    sort: SortState,
    page: usize,
    page_size: usize,
    collapse: CollapseSignal,
}

impl ResultSet {
    /// Initial view: most active installs first.
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self::with_page_size(rows, PAGE_SIZE)
    }

    pub fn with_page_size(rows: Vec<SummaryRow>, page_size: usize) -> Self {
        let mut set = Self {
            order: (0..rows.len()).collect(),
            rows,
            sort: SortState {
                key: SortKey::ActiveInstalls,
                direction: SortDirection::Descending,
            },
            page: 1,
            page_size: page_size.max(1),
            collapse: CollapseSignal::default(),
        };
        set.apply_sort();
        set
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn collapse_signal(&self) -> CollapseSignal {
        self.collapse
    }

    /// Selects a sort key. Re-selecting the current key flips the direction;
    /// a new key starts descending. Resets to the first page and returns the
    /// collapse signal every row has to observe.
    pub fn sort_by(&mut self, key: SortKey) -> CollapseSignal {
        self.sort = if self.sort.key == key {
            SortState {
                key,
                direction: self.sort.direction.flipped(),
            }
        } else {
            SortState {
                key,
                direction: SortDirection::Descending,
            }
        };
        self.apply_sort();
        self.page = 1;
        self.collapse = CollapseSignal {
            generation: self.collapse.generation + 1,
        };
        self.collapse
    }

    /// All rows in display order.
    pub fn sorted(&self) -> impl Iterator<Item = &SummaryRow> + '_ {
        self.order.iter().map(|&idx| &self.rows[idx])
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Rows on the current page, in display order.
    pub fn current_page(&self) -> Vec<&SummaryRow> {
        let start = (self.page - 1) * self.page_size;
        self.order
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&idx| &self.rows[idx])
            .collect()
    }

    fn apply_sort(&mut self) {
        let rows = &self.rows;
        let key = self.sort.key;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        // Stable, so ties keep fetch order in the ascending sequence.
        order.sort_by(|&a, &b| compare(&rows[a], &rows[b], key));
        if self.sort.direction == SortDirection::Descending {
            order.reverse();
        }
        self.order = order;
    }
}

fn compare(a: &SummaryRow, b: &SummaryRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.slug.as_bytes().cmp(b.slug.as_bytes()),
        SortKey::ActiveInstalls => a
            .active_installs
            .unwrap_or(0)
            .cmp(&b.active_installs.unwrap_or(0)),
        SortKey::Matches => a.matches.cmp(&b.matches),
    }
}
