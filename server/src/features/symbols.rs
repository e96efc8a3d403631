//! Cursor-level symbol info and the document symbol outline.

use std::sync::Arc;

use swiftls_analyzer::{Value, tables};
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{
    DocumentSymbol, DocumentSymbolParams, Position, Range, SymbolDetails,
    TextDocumentPositionParams,
};

use crate::bridge::{AnalyzerBridge, translate};
use crate::dispatch::RequestContext;
use crate::server::ServerContext;
use crate::textpos::LineTable;

/// Synthetic analyzer document name for outline requests, so the
/// syntactic open cannot collide with real editor state.
const OUTLINE_PREFIX: &str = "DocumentSymbols:";

pub async fn symbol_info(
    ctx: Arc<ServerContext>,
    params: TextDocumentPositionParams,
    rc: RequestContext,
) -> Result<Vec<SymbolDetails>, ResponseError> {
    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "symbol info for unopened document");
        return Ok(Vec::new());
    };
    let Some(offset) = snapshot
        .line_table()
        .utf8_offset(params.position.line, params.position.character)
    else {
        tracing::warn!(uri = %uri, "symbol info position out of range");
        return Ok(Vec::new());
    };

    let args = ctx.compile_args(&uri, snapshot.language());
    let request = AnalyzerBridge::cursor_info_request(uri.path(), offset, args, false);
    let response = ctx
        .bridge
        .request(request, Some(&rc.token))
        .await
        .map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let k = &tables().keys;
    let name = response.string(&k.name).map(str::to_string);
    let usr = response.string(&k.usr).map(str::to_string);
    if name.is_none() && usr.is_none() {
        return Ok(Vec::new());
    }
    Ok(vec![SymbolDetails {
        name,
        kind: response.uid(&k.kind).as_ref().and_then(translate::symbol_kind),
        usr,
    }])
}

pub async fn document_symbols(
    ctx: Arc<ServerContext>,
    params: DocumentSymbolParams,
    rc: RequestContext,
) -> Result<Vec<DocumentSymbol>, ResponseError> {
    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "document symbols for unopened document");
        return Ok(Vec::new());
    };

    let name = format!("{OUTLINE_PREFIX}{uri}");
    let open = AnalyzerBridge::open_request(&name, snapshot.text(), None, true);
    let outcome = ctx.bridge.request(open, Some(&rc.token)).await;

    // The synthetic document is closed on every path out.
    if let Err(e) = ctx
        .bridge
        .request(AnalyzerBridge::close_request(&name), None)
        .await
    {
        tracing::debug!(uri = %uri, "closing outline document failed: {e}");
    }

    let response = outcome.map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let k = &tables().keys;
    let items = response.array(&k.substructure).unwrap_or_default();
    Ok(walk(items, snapshot.line_table()))
}

/// Recursive substructure walk. Nodes without a mappable kind (or
/// without a usable range) are skipped, but their children are still
/// visited and float up to the skipped node's level.
fn walk(items: &[Value], table: &LineTable) -> Vec<DocumentSymbol> {
    let k = &tables().keys;
    let mut symbols = Vec::new();

    for item in items {
        let children = walk(item.array(&k.substructure).unwrap_or_default(), table);

        let symbol = item
            .uid(&k.kind)
            .as_ref()
            .and_then(translate::symbol_kind)
            .and_then(|kind| {
                let name = item.string(&k.name)?.to_string();
                let range = byte_range(table, item.int(&k.offset)?, item.int(&k.length)?)?;
                let selection_range = item
                    .int(&k.nameoffset)
                    .zip(item.int(&k.namelength))
                    .and_then(|(offset, length)| byte_range(table, offset, length))
                    .unwrap_or(range);
                Some(DocumentSymbol {
                    name,
                    detail: None,
                    kind,
                    range,
                    selection_range,
                    children: None,
                })
            });

        match symbol {
            Some(mut symbol) => {
                if !children.is_empty() {
                    symbol.children = Some(children);
                }
                symbols.push(symbol);
            }
            None => symbols.extend(children),
        }
    }
    symbols
}

fn byte_range(table: &LineTable, offset: i64, length: i64) -> Option<Range> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(length).ok()?)?;
    let (start_line, start_col) = table.line_and_utf16_col(start)?;
    let (end_line, end_col) = table.line_and_utf16_col(end)?;
    Some(Range::new(
        Position::new(start_line, start_col),
        Position::new(end_line, end_col),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::dict;
    use swiftls_analyzer::Uid;
    use swiftls_protocol::types::SymbolKind;

    fn key(name: &str) -> Uid {
        let k = &tables().keys;
        match name {
            "kind" => k.kind.clone(),
            "name" => k.name.clone(),
            "offset" => k.offset.clone(),
            "length" => k.length.clone(),
            "nameoffset" => k.nameoffset.clone(),
            "namelength" => k.namelength.clone(),
            "substructure" => k.substructure.clone(),
            other => Uid::intern(other),
        }
    }

    fn node(kind: &str, name: &str, offset: i64, length: i64, children: Vec<Value>) -> Value {
        let mut entries = vec![
            (key("kind"), Value::from(kind)),
            (key("name"), Value::from(name)),
            (key("offset"), Value::Int(offset)),
            (key("length"), Value::Int(length)),
        ];
        if !children.is_empty() {
            entries.push((key("substructure"), Value::Array(children)));
        }
        Value::Dict(entries.into_iter().collect())
    }

    #[test]
    fn test_walk_builds_hierarchy() {
        let text = "struct S {\n    var x = 1\n}\n";
        let table = LineTable::new(Arc::from(text));
        let items = vec![node(
            "source.lang.swift.decl.struct",
            "S",
            0,
            26,
            vec![node("source.lang.swift.decl.var.instance", "x", 15, 9, vec![])],
        )];

        let symbols = walk(&items, &table);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "S");
        assert_eq!(symbols[0].kind, SymbolKind::Struct);
        assert_eq!(symbols[0].range.start, Position::new(0, 0));
        assert_eq!(symbols[0].range.end, Position::new(2, 1));
        let children = symbols[0].children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "x");
        assert_eq!(children[0].kind, SymbolKind::Property);
    }

    #[test]
    fn test_selection_range_from_name_offsets() {
        let text = "struct Name {}";
        let table = LineTable::new(Arc::from(text));
        let symbols = walk(
            &[dict([
                (key("kind"), Value::from("source.lang.swift.decl.struct")),
                (key("name"), Value::from("Name")),
                (key("offset"), Value::Int(0)),
                (key("length"), Value::Int(14)),
                (key("nameoffset"), Value::Int(7)),
                (key("namelength"), Value::Int(4)),
            ])],
            &table,
        );
        assert_eq!(symbols[0].selection_range.start, Position::new(0, 7));
        assert_eq!(symbols[0].selection_range.end, Position::new(0, 11));
    }

    #[test]
    fn test_unmapped_parent_floats_children_up() {
        let text = "if x {\n    func f() {}\n}\n";
        let table = LineTable::new(Arc::from(text));
        let items = vec![node(
            "source.lang.swift.stmt.if",
            "",
            0,
            24,
            vec![node("source.lang.swift.decl.function.free", "f()", 11, 11, vec![])],
        )];

        let symbols = walk(&items, &table);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "f()");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert!(symbols[0].children.is_none());
    }

    #[test]
    fn test_unplaceable_node_is_skipped_but_children_kept() {
        let text = "short";
        let table = LineTable::new(Arc::from(text));
        let items = vec![node(
            "source.lang.swift.decl.class",
            "C",
            0,
            9999,
            vec![node("source.lang.swift.decl.var.instance", "x", 0, 5, vec![])],
        )];

        let symbols = walk(&items, &table);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "x");
    }

    #[test]
    fn test_empty_substructure() {
        let table = LineTable::new(Arc::from(""));
        assert!(walk(&[], &table).is_empty());
        assert!(walk(&[dict([])], &table).is_empty());
    }
}
