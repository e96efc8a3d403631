//! Translation tables between the analyzer vocabulary and LSP shapes.

use swiftls_analyzer::{Uid, Value, tables};
use swiftls_protocol::types::{
    CompletionItemKind, Diagnostic, DiagnosticSeverity, Position, Range, SymbolKind,
};

use crate::textpos::LineTable;

/// Diagnostic severity. Anything beyond error/warning maps to absent.
#[must_use]
pub fn severity(uid: &Uid) -> Option<DiagnosticSeverity> {
    let v = &tables().values;
    if *uid == v.diag_error {
        Some(DiagnosticSeverity::Error)
    } else if *uid == v.diag_warning {
        Some(DiagnosticSeverity::Warning)
    } else {
        None
    }
}

/// Whether a syntax-map kind folds as a comment.
#[must_use]
pub fn is_comment_kind(uid: &Uid) -> bool {
    let v = &tables().values;
    *uid == v.syntax_comment
        || *uid == v.syntax_comment_marker
        || *uid == v.syntax_comment_url
        || *uid == v.syntax_doccomment
        || *uid == v.syntax_doccomment_field
}

/// Completion kind. Unmapped kinds surface as `Value`.
#[must_use]
pub fn completion_kind(uid: &Uid) -> CompletionItemKind {
    let v = &tables().values;
    if *uid == v.decl_class {
        CompletionItemKind::Class
    } else if *uid == v.decl_struct {
        CompletionItemKind::Struct
    } else if *uid == v.decl_enum {
        CompletionItemKind::Enum
    } else if *uid == v.decl_enumelement {
        CompletionItemKind::EnumMember
    } else if *uid == v.decl_protocol {
        CompletionItemKind::Interface
    } else if *uid == v.decl_associatedtype
        || *uid == v.decl_generic_type_param
        || *uid == v.decl_typealias
    {
        CompletionItemKind::TypeParameter
    } else if *uid == v.decl_constructor {
        CompletionItemKind::Constructor
    } else if *uid == v.decl_method_static
        || *uid == v.decl_method_class
        || *uid == v.decl_method_instance
    {
        CompletionItemKind::Method
    } else if *uid == v.decl_operator_prefix
        || *uid == v.decl_operator_postfix
        || *uid == v.decl_operator_infix
    {
        CompletionItemKind::Operator
    } else if *uid == v.decl_function_free {
        CompletionItemKind::Function
    } else if *uid == v.decl_var_static || *uid == v.decl_var_class || *uid == v.decl_var_instance {
        CompletionItemKind::Property
    } else if *uid == v.decl_var_local || *uid == v.decl_var_global || *uid == v.decl_var_parameter
    {
        CompletionItemKind::Variable
    } else if *uid == v.decl_module {
        CompletionItemKind::Module
    } else if *uid == v.keyword {
        CompletionItemKind::Keyword
    } else {
        CompletionItemKind::Value
    }
}

/// Symbol kind for document symbols and cursor info. Unmapped kinds are
/// absent: the caller skips the node but still walks its children.
#[must_use]
pub fn symbol_kind(uid: &Uid) -> Option<SymbolKind> {
    let v = &tables().values;
    if *uid == v.decl_class {
        Some(SymbolKind::Class)
    } else if *uid == v.decl_method_instance
        || *uid == v.decl_method_static
        || *uid == v.decl_method_class
    {
        Some(SymbolKind::Method)
    } else if *uid == v.decl_var_static || *uid == v.decl_var_class || *uid == v.decl_var_instance {
        Some(SymbolKind::Property)
    } else if *uid == v.decl_enum {
        Some(SymbolKind::Enum)
    } else if *uid == v.decl_enumelement {
        Some(SymbolKind::EnumMember)
    } else if *uid == v.decl_protocol {
        Some(SymbolKind::Interface)
    } else if *uid == v.decl_function_free {
        Some(SymbolKind::Function)
    } else if *uid == v.decl_var_global || *uid == v.decl_var_local {
        Some(SymbolKind::Variable)
    } else if *uid == v.decl_struct {
        Some(SymbolKind::Struct)
    } else if *uid == v.decl_generic_type_param {
        Some(SymbolKind::TypeParameter)
    } else if *uid == v.decl_extension {
        Some(SymbolKind::Namespace)
    } else {
        None
    }
}

/// Extract LSP diagnostics from an analyzer response.
///
/// An absent `key.diagnostics` is an empty batch; the caller publishes
/// the empty array to clear prior state. Entries carry 1-based
/// line/column (byte columns); entries with only `key.offset` fall back
/// to offset mapping. Unplaceable entries are dropped.
#[must_use]
pub fn diagnostics(response: &Value, table: &LineTable) -> Vec<Diagnostic> {
    let k = &tables().keys;
    let Some(entries) = response.array(&k.diagnostics) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let message = entry.string(&k.description)?.to_string();
            let position = position_of(entry, table)?;
            Some(Diagnostic {
                range: Range::new(position, position),
                severity: entry.uid(&k.severity).as_ref().and_then(severity),
                source: Some("sourcekitd".to_string()),
                message,
            })
        })
        .collect()
}

fn position_of(entry: &Value, table: &LineTable) -> Option<Position> {
    let k = &tables().keys;
    if let (Some(line), Some(column)) = (entry.int(&k.line), entry.int(&k.column)) {
        let line = u32::try_from(line.checked_sub(1)?).ok()?;
        let byte_col = usize::try_from(column.checked_sub(1)?).ok()?;
        let character = table.utf16_col(line, byte_col)?;
        return Some(Position::new(line, character));
    }
    let offset = usize::try_from(entry.int(&k.offset)?).ok()?;
    let (line, character) = table.line_and_utf16_col(offset)?;
    Some(Position::new(line, character))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::dict;
    use std::sync::Arc;

    fn uid(s: &str) -> Uid {
        Uid::intern(s)
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(
            severity(&uid("source.diagnostic.severity.error")),
            Some(DiagnosticSeverity::Error)
        );
        assert_eq!(
            severity(&uid("source.diagnostic.severity.warning")),
            Some(DiagnosticSeverity::Warning)
        );
        assert_eq!(severity(&uid("source.diagnostic.severity.note")), None);
    }

    #[test]
    fn test_comment_kinds() {
        for spelling in [
            "source.lang.swift.syntaxtype.comment",
            "source.lang.swift.syntaxtype.comment.mark",
            "source.lang.swift.syntaxtype.comment.url",
            "source.lang.swift.syntaxtype.doccomment",
            "source.lang.swift.syntaxtype.doccomment.field",
        ] {
            assert!(is_comment_kind(&uid(spelling)), "{spelling}");
        }
        assert!(!is_comment_kind(&uid("source.lang.swift.syntaxtype.keyword")));
    }

    #[test]
    fn test_completion_kind_table() {
        let cases = [
            ("source.lang.swift.decl.class", CompletionItemKind::Class),
            ("source.lang.swift.decl.struct", CompletionItemKind::Struct),
            ("source.lang.swift.decl.enumelement", CompletionItemKind::EnumMember),
            ("source.lang.swift.decl.protocol", CompletionItemKind::Interface),
            ("source.lang.swift.decl.associatedtype", CompletionItemKind::TypeParameter),
            ("source.lang.swift.decl.typealias", CompletionItemKind::TypeParameter),
            ("source.lang.swift.decl.function.constructor", CompletionItemKind::Constructor),
            ("source.lang.swift.decl.function.method.instance", CompletionItemKind::Method),
            ("source.lang.swift.decl.function.method.static", CompletionItemKind::Method),
            ("source.lang.swift.decl.function.operator.infix", CompletionItemKind::Operator),
            ("source.lang.swift.decl.function.free", CompletionItemKind::Function),
            ("source.lang.swift.decl.var.instance", CompletionItemKind::Property),
            ("source.lang.swift.decl.var.local", CompletionItemKind::Variable),
            ("source.lang.swift.decl.var.parameter", CompletionItemKind::Variable),
            ("source.lang.swift.decl.module", CompletionItemKind::Module),
            ("source.lang.swift.keyword", CompletionItemKind::Keyword),
        ];
        for (spelling, expected) in cases {
            assert_eq!(completion_kind(&uid(spelling)), expected, "{spelling}");
        }
        assert_eq!(
            completion_kind(&uid("source.lang.swift.something.new")),
            CompletionItemKind::Value
        );
    }

    #[test]
    fn test_symbol_kind_table() {
        let cases = [
            ("source.lang.swift.decl.class", SymbolKind::Class),
            ("source.lang.swift.decl.function.method.instance", SymbolKind::Method),
            ("source.lang.swift.decl.var.instance", SymbolKind::Property),
            ("source.lang.swift.decl.enum", SymbolKind::Enum),
            ("source.lang.swift.decl.enumelement", SymbolKind::EnumMember),
            ("source.lang.swift.decl.protocol", SymbolKind::Interface),
            ("source.lang.swift.decl.function.free", SymbolKind::Function),
            ("source.lang.swift.decl.var.global", SymbolKind::Variable),
            ("source.lang.swift.decl.struct", SymbolKind::Struct),
            ("source.lang.swift.decl.generic_type_param", SymbolKind::TypeParameter),
            ("source.lang.swift.decl.extension", SymbolKind::Namespace),
        ];
        for (spelling, expected) in cases {
            assert_eq!(symbol_kind(&uid(spelling)), Some(expected), "{spelling}");
        }
        assert_eq!(symbol_kind(&uid("source.lang.swift.expr.call")), None);
    }

    #[test]
    fn test_diagnostics_from_line_and_column() {
        let k = &tables().keys;
        let table = LineTable::new(Arc::from("let a = 1\nlet bé = 2\n"));
        let response = dict([(
            k.diagnostics.clone(),
            Value::Array(vec![dict([
                (k.line.clone(), Value::Int(2)),
                // 1-based byte column 8 → after the two-byte 'é'.
                (k.column.clone(), Value::Int(8)),
                (k.severity.clone(), Value::from("source.diagnostic.severity.error")),
                (k.description.clone(), Value::from("oops")),
            ])]),
        )]);

        let out = diagnostics(&response, &table);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "oops");
        assert_eq!(out[0].severity, Some(DiagnosticSeverity::Error));
        assert_eq!(out[0].range.start, Position::new(1, 6));
        assert_eq!(out[0].range.start, out[0].range.end);
    }

    #[test]
    fn test_diagnostics_offset_fallback() {
        let k = &tables().keys;
        let table = LineTable::new(Arc::from("ab\ncd"));
        let response = dict([(
            k.diagnostics.clone(),
            Value::Array(vec![dict([
                (k.offset.clone(), Value::Int(4)),
                (k.description.clone(), Value::from("here")),
            ])]),
        )]);

        let out = diagnostics(&response, &table);
        assert_eq!(out[0].range.start, Position::new(1, 1));
        assert_eq!(out[0].severity, None);
    }

    #[test]
    fn test_diagnostics_absent_key_is_empty_batch() {
        let table = LineTable::new(Arc::from(""));
        assert!(diagnostics(&dict([]), &table).is_empty());
    }

    #[test]
    fn test_diagnostics_unplaceable_entry_dropped() {
        let k = &tables().keys;
        let table = LineTable::new(Arc::from("x"));
        let response = dict([(
            k.diagnostics.clone(),
            Value::Array(vec![dict([
                (k.line.clone(), Value::Int(40)),
                (k.column.clone(), Value::Int(1)),
                (k.description.clone(), Value::from("far away")),
            ])]),
        )]);
        assert!(diagnostics(&response, &table).is_empty());
    }
}
