//! Code completion.

use std::sync::Arc;

use swiftls_analyzer::tables;
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{
    CompletionItem, CompletionList, InsertTextFormat, TextDocumentPositionParams,
};

use crate::bridge::{AnalyzerBridge, translate};
use crate::dispatch::RequestContext;
use crate::server::ServerContext;

pub async fn handle(
    ctx: Arc<ServerContext>,
    params: TextDocumentPositionParams,
    rc: RequestContext,
) -> Result<CompletionList, ResponseError> {
    let empty = CompletionList {
        is_incomplete: false,
        items: Vec::new(),
    };

    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "completion for unopened document");
        return Ok(empty);
    };

    let position = params.position;
    let Some(offset) = snapshot
        .line_table()
        .utf8_offset(position.line, position.character)
    else {
        tracing::warn!(uri = %uri, line = position.line, character = position.character,
            "completion position out of range");
        return Ok(empty);
    };

    // The native completer wants the start of the identifier under the
    // cursor, not the cursor itself.
    let offset = rewind_to_identifier_start(snapshot.text(), offset);

    let args = ctx.compile_args(&uri, snapshot.language());
    let request = AnalyzerBridge::completion_request(uri.path(), offset, snapshot.text(), args);
    let response = ctx
        .bridge
        .request(request, Some(&rc.token))
        .await
        .map_err(super::reply_error)?;
    if rc.token.is_cancelled() {
        return Err(ResponseError::cancelled());
    }

    let k = &tables().keys;
    let items = response
        .array(&k.results)
        .unwrap_or_default()
        .iter()
        .filter_map(|result| {
            let label = result.string(&k.description)?.to_string();
            let insert_text = result.string(&k.sourcetext).map(|text| {
                rewrite_placeholders(text).unwrap_or_else(|| text.to_string())
            });
            Some(CompletionItem {
                label,
                kind: result.uid(&k.kind).map(|u| translate::completion_kind(&u)),
                detail: result.string(&k.typename).map(str::to_string),
                filter_text: result.string(&k.name).map(str::to_string),
                insert_text,
                insert_text_format: Some(InsertTextFormat::Snippet),
            })
        })
        .collect();

    Ok(CompletionList {
        is_incomplete: false,
        items,
    })
}

/// Walk backwards across identifier characters (letters, digits,
/// underscore) to the start of the identifier under the cursor.
pub(crate) fn rewind_to_identifier_start(text: &str, offset: usize) -> usize {
    let mut start = offset;
    while start > 0 {
        let Some(ch) = text[..start].chars().next_back() else {
            break;
        };
        if ch.is_alphanumeric() || ch == '_' {
            start -= ch.len_utf8();
        } else {
            break;
        }
    }
    start
}

/// Rewrite `<#…#>` placeholders to LSP snippet slots `${n:…}`, numbering
/// from 1 in a single left-to-right scan. A placeholder opened but never
/// closed makes the whole rewrite fail (`None`); the caller then keeps
/// the original text. Rewriting a string with no `<#` is the identity,
/// so the rewrite is idempotent.
pub(crate) fn rewrite_placeholders(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut slot = 1;
    while let Some(open) = rest.find("<#") {
        out.push_str(&rest[..open]);
        let inner_and_rest = &rest[open + 2..];
        let close = inner_and_rest.find("#>")?;
        out.push_str(&format!("${{{slot}:{}}}", &inner_and_rest[..close]));
        slot += 1;
        rest = &inner_and_rest[close + 2..];
    }
    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewind_over_ascii_identifier() {
        let text = "foo.barBaz";
        assert_eq!(rewind_to_identifier_start(text, 10), 4);
        assert_eq!(rewind_to_identifier_start(text, 7), 4);
        assert_eq!(rewind_to_identifier_start(text, 4), 4);
    }

    #[test]
    fn test_rewind_stops_at_non_identifier() {
        assert_eq!(rewind_to_identifier_start("a + bcd", 7), 4);
        assert_eq!(rewind_to_identifier_start("(x)", 2), 1);
    }

    #[test]
    fn test_rewind_over_digits_and_underscore() {
        assert_eq!(rewind_to_identifier_start("v_2x", 4), 0);
    }

    #[test]
    fn test_rewind_over_unicode_letters() {
        let text = "x.héllo";
        assert_eq!(rewind_to_identifier_start(text, text.len()), 2);
    }

    #[test]
    fn test_rewind_at_start_of_buffer() {
        assert_eq!(rewind_to_identifier_start("abc", 2), 0);
    }

    #[test]
    fn test_rewrite_single_placeholder() {
        assert_eq!(
            rewrite_placeholders("foo(<#bar#>)").unwrap(),
            "foo(${1:bar})"
        );
    }

    #[test]
    fn test_rewrite_numbers_left_to_right() {
        assert_eq!(
            rewrite_placeholders("min(<#x#>, <#y#>)").unwrap(),
            "min(${1:x}, ${2:y})"
        );
    }

    #[test]
    fn test_rewrite_without_placeholders_is_identity() {
        assert_eq!(rewrite_placeholders("plain()").unwrap(), "plain()");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let once = rewrite_placeholders("f(<#a#>, <#b#>)").unwrap();
        assert_eq!(rewrite_placeholders(&once).unwrap(), once);
    }

    #[test]
    fn test_malformed_placeholder_aborts() {
        assert_eq!(rewrite_placeholders("foo(<#bar"), None);
        assert_eq!(rewrite_placeholders("a<#b#>c<#d"), None);
    }

    #[test]
    fn test_stray_close_marker_passes_through() {
        assert_eq!(rewrite_placeholders("a#>b").unwrap(), "a#>b");
    }
}
