use tracing::debug;

use super::{BoardSource, MondayError};
use crate::models::{Column, Item};

/// Everything the pipeline needs from one fetch cycle: the complete item set
/// in page order plus the schema it was fetched under.
#[derive(Debug, Clone)]
pub struct BoardData {
    pub items: Vec<Item>,
    pub columns: Vec<Column>,
}

/// Drain every item page of a board, following the continuation cursor until a
/// page arrives without one. Any failed request aborts the whole cycle; the
/// caller never sees partial results.
pub async fn fetch_board<S>(source: &S, board_id: u64) -> Result<BoardData, MondayError>
where
    S: BoardSource + ?Sized,
{
    let columns = source.board_columns(board_id).await?;

    let mut items = Vec::new();
    let mut page = source.items_page(board_id, None).await?;
    items.append(&mut page.items);

    while let Some(cursor) = page.cursor.take() {
        page = source.items_page(board_id, Some(&cursor)).await?;
        items.append(&mut page.items);
    }

    debug!(board_id, items = items.len(), columns = columns.len(), "board fetch complete");
    Ok(BoardData { items, columns })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
