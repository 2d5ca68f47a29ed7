// SuburbExplorer - core/export.rs
//
// CSV export of the detail table for a filtered view.
// Core layer: writes to any Write trait object.

use crate::core::filter::FilteredView;
use crate::core::model::{Column, Field, Record};
use crate::util::error::ExportError;
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

/// Column and direction the detail table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub descending: bool,
}

/// Turn user-supplied column names into columns of `R`.
///
/// An empty list selects every column of the table in default order.
pub fn resolve_columns<R: Record>(names: &[String]) -> Result<Vec<Column>, ExportError> {
    if names.is_empty() {
        return Ok(R::COLUMNS.to_vec());
    }
    names
        .iter()
        .map(|name| {
            name.parse::<Column>()
                .ok()
                .filter(|c| R::COLUMNS.contains(c))
                .ok_or_else(|| ExportError::UnknownColumn {
                    column: name.trim().to_string(),
                    table: R::TABLE,
                })
        })
        .collect()
}

/// Row order of the detail table: the view's indices, stably sorted by
/// `sort`. Nulls go last whichever the direction.
pub fn sorted_indices<R: Record>(
    view: &FilteredView<'_, R>,
    sort: Option<&SortKey>,
) -> Vec<usize> {
    let mut indices = view.indices().to_vec();
    let Some(key) = sort else {
        return indices;
    };

    let table = view.table();
    indices.sort_by(|&a, &b| {
        let fa = table.get(a).and_then(|r| r.field(key.column)).unwrap_or(Field::Null);
        let fb = table.get(b).and_then(|r| r.field(key.column)).unwrap_or(Field::Null);
        compare_fields(&fa, &fb, key.descending)
    });
    indices
}

fn compare_fields(a: &Field<'_>, b: &Field<'_>, descending: bool) -> Ordering {
    let ordered = |o: Ordering| if descending { o.reverse() } else { o };
    match (a, b) {
        (Field::Null, Field::Null) => Ordering::Equal,
        (Field::Null, _) => Ordering::Greater,
        (_, Field::Null) => Ordering::Less,
        (Field::Number(x), Field::Number(y)) => ordered(x.total_cmp(y)),
        (Field::Text(x), Field::Text(y)) => ordered(x.cmp(y)),
        // A column holds a single kind; numbers before text if it ever mixes.
        (Field::Number(_), Field::Text(_)) => ordered(Ordering::Less),
        (Field::Text(_), Field::Number(_)) => ordered(Ordering::Greater),
    }
}

/// Export the rows of `view` to CSV.
///
/// Writes a header row of `columns` in the given order, then one record per
/// row in `sorted_indices` order. Null cells are empty fields.
pub fn export_csv<R: Record, W: Write>(
    view: &FilteredView<'_, R>,
    columns: &[Column],
    sort: Option<&SortKey>,
    max_rows: usize,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let sort_column = sort.map(|k| k.column);
    if let Some(column) = columns
        .iter()
        .copied()
        .chain(sort_column)
        .find(|c| !R::COLUMNS.contains(c))
    {
        return Err(ExportError::UnknownColumn {
            column: column.header().to_string(),
            table: R::TABLE,
        });
    }
    if view.len() > max_rows {
        return Err(ExportError::TooManyRows {
            count: view.len(),
            max: max_rows,
        });
    }

    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(columns.iter().map(|c| c.header()))
        .map_err(csv_err)?;

    let table = view.table();
    let mut count = 0;
    for idx in sorted_indices(view, sort) {
        let Some(row) = table.get(idx) else {
            continue;
        };
        let fields: Vec<Field<'_>> = columns
            .iter()
            .map(|&c| row.field(c).unwrap_or(Field::Null))
            .collect();
        csv_writer
            .write_record(fields.iter().map(|f| f.to_text().into_owned()))
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        table = R::TABLE,
        rows = count,
        columns = columns.len(),
        path = %export_path.display(),
        "CSV export written"
    );
    Ok(count)
}
