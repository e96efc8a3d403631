//! Hover, built on cursor info.

use std::sync::Arc;

use swiftls_analyzer::tables;
use swiftls_protocol::ResponseError;
use swiftls_protocol::types::{Hover, MarkupContent, MarkupKind, TextDocumentPositionParams};

use crate::bridge::AnalyzerBridge;
use crate::dispatch::RequestContext;
use crate::server::ServerContext;

pub async fn handle(
    ctx: Arc<ServerContext>,
    params: TextDocumentPositionParams,
    rc: RequestContext,
) -> Result<Option<Hover>, ResponseError> {
    let uri = params.text_document.uri;
    let Some(snapshot) = ctx.snapshot(&uri) else {
        tracing::warn!(uri = %uri, "hover for unopened document");
        return Ok(None);
    };
    let Some(offset) = snapshot
        .line_table()
        .utf8_offset(params.position.line, params.position.character)
    else {
        tracing::warn!(uri = %uri, "hover position out of range");
        return Ok(None);
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
    let Some(name) = response.string(&k.name) else {
        return Ok(None);
    };

    // Documentation XML wins over the annotated declaration; either way a
    // conversion failure falls back to the raw string.
    let body = response
        .string(&k.doc_full_as_xml)
        .or_else(|| response.string(&k.annotated_decl))
        .map(|xml| xml_to_markdown(xml).unwrap_or_else(|| xml.to_string()));

    let mut value = format!("# {name}");
    if let Some(body) = body {
        value.push('\n');
        value.push_str(&body);
    }

    Ok(Some(Hover {
        contents: MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        },
        range: None,
    }))
}

/// Convert the analyzer's documentation XML to markdown.
///
/// `Declaration` elements become fenced Swift code blocks and `Para`
/// breaks paragraphs; other markup is stripped. Unbalanced tags or an
/// unterminated entity make the conversion fail so the caller can fall
/// back to the raw string.
pub(crate) fn xml_to_markdown(xml: &str) -> Option<String> {
    let mut out = String::with_capacity(xml.len());
    let mut open_tags: Vec<String> = Vec::new();
    let mut rest = xml;

    while let Some(angle) = rest.find('<') {
        push_decoded_text(&mut out, &rest[..angle])?;
        let tag_and_rest = &rest[angle + 1..];
        let close = tag_and_rest.find('>')?;
        let tag = &tag_and_rest[..close];
        rest = &tag_and_rest[close + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            let opened = open_tags.pop()?;
            if opened != name {
                return None;
            }
            match name {
                "Declaration" => out.push_str("\n```"),
                "Para" => out.push_str("\n\n"),
                _ => {}
            }
        } else if tag.ends_with('/') || tag.starts_with('?') || tag.starts_with('!') {
            // Self-closing or prolog: no content, no stack entry.
        } else {
            let name = tag.split_whitespace().next().unwrap_or(tag);
            open_tags.push(name.to_string());
            if name == "Declaration" {
                out.push_str("```swift\n");
            }
        }
    }
    push_decoded_text(&mut out, rest)?;

    open_tags.is_empty().then(|| out.trim().to_string())
}

fn push_decoded_text(out: &mut String, text: &str) -> Option<()> {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let entity_and_rest = &rest[amp + 1..];
        let semi = entity_and_rest.find(';')?;
        match &entity_and_rest[..semi] {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            other => {
                // Unknown entity: keep it verbatim.
                out.push('&');
                out.push_str(other);
                out.push(';');
            }
        }
        rest = &entity_and_rest[semi + 1..];
    }
    out.push_str(rest);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_becomes_code_block() {
        let xml = "<Declaration>func foo() -&gt; String</Declaration>";
        assert_eq!(
            xml_to_markdown(xml).unwrap(),
            "```swift\nfunc foo() -> String\n```"
        );
    }

    #[test]
    fn test_paras_become_paragraphs() {
        let xml = "<Para>First.</Para><Para>Second.</Para>";
        assert_eq!(xml_to_markdown(xml).unwrap(), "First.\n\nSecond.");
    }

    #[test]
    fn test_nested_markup_is_stripped() {
        let xml = "<Function><Name>foo</Name><Abstract><Para>Does a thing.</Para></Abstract></Function>";
        assert_eq!(xml_to_markdown(xml).unwrap(), "fooDoes a thing.");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(xml_to_markdown("a &lt; b &amp;&amp; c &gt; d").unwrap(), "a < b && c > d");
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        assert_eq!(xml_to_markdown("&copy;").unwrap(), "&copy;");
    }

    #[test]
    fn test_self_closing_and_prolog_ignored() {
        let xml = "<?xml version=\"1.0\"?><Other usr=\"s:x\"/>text";
        assert_eq!(xml_to_markdown(xml).unwrap(), "text");
    }

    #[test]
    fn test_unbalanced_tags_fail() {
        assert!(xml_to_markdown("<Para>oops").is_none());
        assert!(xml_to_markdown("<A>x</B>").is_none());
        assert!(xml_to_markdown("no close <").is_none());
    }

    #[test]
    fn test_unterminated_entity_fails() {
        assert!(xml_to_markdown("a &lt b").is_none());
    }
}
