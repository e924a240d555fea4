//! One-based page slicing shared by every listing.

use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

/// A requested page. Out-of-range values are clamped rather than rejected:
/// page and page size are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: i64, per_page: u32) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1).saturating_mul(self.per_page as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_num: Option<u32>,
    pub prev_num: Option<u32>,
}

impl<T> Page<T> {
    /// Assemble a page from an already-sliced `items` and the `total` length
    /// of the sequence it was cut from.
    pub fn from_parts(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let page = request.page();
        let has_prev = page > 1;
        let has_next = (page as u64) * (request.per_page() as u64) < total;
        Self {
            items,
            page,
            per_page: request.per_page(),
            total,
            has_next,
            has_prev,
            next_num: has_next.then(|| page + 1),
            prev_num: has_prev.then(|| page - 1),
        }
    }

    /// Slice an in-memory, already-ordered sequence.
    #[cfg(test)]
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.per_page() as usize)
            .collect();
        Self::from_parts(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            has_next: self.has_next,
            has_prev: self.has_prev,
            next_num: self.next_num,
            prev_num: self.prev_num,
        }
    }
}

/// Count and slice a filtered, ordered query against one snapshot.
///
/// `from_where` is everything after `SELECT ...`: the `FROM`, joins and
/// `WHERE` clause, using anonymous `?` placeholders bound from `params`.
/// `order_by` must give a total order so pages never overlap.
pub fn fetch_page<T, F>(
    conn: &mut Connection,
    columns: &str,
    from_where: &str,
    order_by: &str,
    params: &[&dyn ToSql],
    request: PageRequest,
    map_row: F,
) -> rusqlite::Result<Page<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    // A deferred transaction pins the read snapshot at its first statement,
    // so the count and the slice cannot disagree under concurrent writes
    let tx = conn.transaction()?;
    let page = query_page(&tx, columns, from_where, order_by, params, request, map_row)?;
    tx.commit()?;
    Ok(page)
}

/// [`fetch_page`] for a caller that already holds a transaction.
pub fn query_page<T, F>(
    conn: &Connection,
    columns: &str,
    from_where: &str,
    order_by: &str,
    params: &[&dyn ToSql],
    request: PageRequest,
    map_row: F,
) -> rusqlite::Result<Page<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {}", from_where),
        params,
        |row| row.get(0),
    )?;

    let limit = request.per_page() as i64;
    let offset = request.offset();
    let mut slice_params: Vec<&dyn ToSql> = params.to_vec();
    slice_params.push(&limit);
    slice_params.push(&offset);

    let mut stmt = conn.prepare(&format!(
        "SELECT {} {} ORDER BY {} LIMIT ? OFFSET ?",
        columns, from_where, order_by
    ))?;
    let items = stmt
        .query_map(slice_params.as_slice(), map_row)?
        .collect::<rusqlite::Result<Vec<T>>>()?;

    Ok(Page::from_parts(items, request, total.max(0) as u64))
}
