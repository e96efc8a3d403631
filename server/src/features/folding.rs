//! Folding ranges from the syntax map and substructure.

use std::sync::Arc;

use swiftls_analyzer::{Value, tables};
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{FoldingRange, FoldingRangeKind, FoldingRangeParams};

use crate::bridge::{AnalyzerBridge, translate};
use crate::dispatch::RequestContext;
use crate::server::ServerContext;
use crate::textpos::LineTable;

/// Synthetic analyzer document name for folding requests.
const FOLDING_PREFIX: &str = "FoldingRanges:";

pub async fn handle(
    ctx: Arc<ServerContext>,
    params: FoldingRangeParams,
    rc: RequestContext,
) -> Result<Vec<FoldingRange>, ResponseError> {
    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "folding for unopened document");
        return Ok(Vec::new());
    };

    let name = format!("{FOLDING_PREFIX}{uri}");
    let open = AnalyzerBridge::open_request(&name, snapshot.text(), None, true);
    let outcome = ctx.bridge.request(open, Some(&rc.token)).await;

    if let Err(e) = ctx
        .bridge
        .request(AnalyzerBridge::close_request(&name), None)
        .await
    {
        tracing::debug!(uri = %uri, "closing folding document failed: {e}");
    }

    let response = outcome.map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let client = ctx.client_view();
    Ok(collect(
        &response,
        snapshot.line_table(),
        client.folding_range_limit,
        client.line_folding_only,
    ))
}

struct Collector<'a> {
    table: &'a LineTable,
    limit: Option<u32>,
    line_only: bool,
    out: Vec<FoldingRange>,
}

impl Collector<'_> {
    fn full(&self) -> bool {
        self.limit.is_some_and(|limit| self.out.len() >= limit as usize)
    }

    /// Emit one folding candidate for the byte span `[start, end)`.
    /// Unmappable spans are skipped; in line-only mode a span that
    /// collapses to a single line is dropped.
    fn emit(&mut self, start: usize, end: usize, kind: Option<FoldingRangeKind>) {
        if self.full() {
            return;
        }
        let Some((start_line, start_col)) = self.table.line_and_utf16_col(start) else {
            return;
        };
        let Some((end_line, end_col)) = self.table.line_and_utf16_col(end) else {
            return;
        };
        if self.line_only {
            let Some(last_line) = end_line.checked_sub(1) else {
                return;
            };
            if last_line <= start_line {
                return;
            }
            self.out.push(FoldingRange {
                start_line,
                start_character: None,
                end_line: last_line,
                end_character: None,
                kind,
            });
        } else {
            self.out.push(FoldingRange {
                start_line,
                start_character: Some(start_col),
                end_line,
                end_character: Some(end_col),
                kind,
            });
        }
    }
}

/// Gather comment ranges (byte-adjacent runs coalesced) and code ranges
/// (non-empty bodies, walked with an explicit stack), bounded by the
/// client's range limit, sorted by start line then end line.
fn collect(
    response: &Value,
    table: &LineTable,
    limit: Option<u32>,
    line_only: bool,
) -> Vec<FoldingRange> {
    let k = &tables().keys;
    let mut collector = Collector {
        table,
        limit,
        line_only,
        out: Vec::new(),
    };

    // Comments from the syntax map.
    let mut run: Option<(usize, usize)> = None;
    for entry in response.array(&k.syntaxmap).unwrap_or_default() {
        if collector.full() {
            break;
        }
        let comment = entry
            .uid(&k.kind)
            .is_some_and(|kind| translate::is_comment_kind(&kind));
        if !comment {
            continue;
        }
        let Some(start) = entry.int(&k.offset).and_then(|n| usize::try_from(n).ok()) else {
            continue;
        };
        let Some(len) = entry.int(&k.length).and_then(|n| usize::try_from(n).ok()) else {
            continue;
        };
        run = match run {
            Some((run_start, run_end)) if run_end == start => Some((run_start, start + len)),
            Some((run_start, run_end)) => {
                collector.emit(run_start, run_end, Some(FoldingRangeKind::Comment));
                Some((start, start + len))
            }
            None => Some((start, start + len)),
        };
    }
    if let Some((run_start, run_end)) = run {
        collector.emit(run_start, run_end, Some(FoldingRangeKind::Comment));
    }

    // Code bodies from the substructure.
    let mut stack: Vec<&Value> = response
        .array(&k.substructure)
        .unwrap_or_default()
        .iter()
        .rev()
        .collect();
    while let Some(item) = stack.pop() {
        if collector.full() {
            break;
        }
        if let (Some(offset), Some(length)) = (
            item.int(&k.bodyoffset).and_then(|n| usize::try_from(n).ok()),
            item.int(&k.bodylength).and_then(|n| usize::try_from(n).ok()),
        ) && length > 0
        {
            collector.emit(offset, offset + length, None);
        }
        stack.extend(item.array(&k.substructure).unwrap_or_default().iter().rev());
    }

    let mut ranges = collector.out;
    ranges.sort_by_key(|r| (r.start_line, r.end_line));
    ranges
}
