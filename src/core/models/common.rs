#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new(limit: i64, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    pub fn page(page: i64, size: i64) -> Self {
        Self {
            limit: size,
            offset: Some((page.max(1) - 1) * size),
        }
    }

    /// Applies the window to an already ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        items.into_iter().skip(offset).take(self.limit.max(0) as usize).collect()
    }
}
