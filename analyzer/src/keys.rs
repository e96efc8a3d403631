//! Well-known UID tables.
//!
//! The analyzer vocabulary is interned once per process and shared.
//! Spellings follow the native library's `source.request.*` / `key.*` /
//! `source.lang.swift.*` conventions.

use std::sync::OnceLock;

use crate::uid::Uid;

/// Request-name UIDs.
#[derive(Debug)]
pub struct Requests {
    pub editor_open: Uid,
    pub editor_close: Uid,
    pub editor_replacetext: Uid,
    pub codecomplete: Uid,
    pub cursorinfo: Uid,
    pub relatedidents: Uid,
    pub semantic_refactoring: Uid,
}

/// Dictionary-key UIDs.
#[derive(Debug)]
pub struct Keys {
    pub request: Uid,
    pub name: Uid,
    pub sourcefile: Uid,
    pub sourcetext: Uid,
    pub compilerargs: Uid,
    pub offset: Uid,
    pub length: Uid,
    pub nameoffset: Uid,
    pub namelength: Uid,
    pub bodyoffset: Uid,
    pub bodylength: Uid,
    pub kind: Uid,
    pub severity: Uid,
    pub description: Uid,
    pub diagnostics: Uid,
    pub results: Uid,
    pub substructure: Uid,
    pub syntaxmap: Uid,
    pub typename: Uid,
    pub usr: Uid,
    pub annotated_decl: Uid,
    pub doc_full_as_xml: Uid,
    pub enablesyntaxmap: Uid,
    pub enablesubstructure: Uid,
    pub syntactic_only: Uid,
    pub line: Uid,
    pub column: Uid,
    pub endline: Uid,
    pub endcolumn: Uid,
    pub text: Uid,
    pub actionuid: Uid,
    pub actionname: Uid,
    pub retrieve_refactor_actions: Uid,
    pub refactor_actions: Uid,
    pub categorizededits: Uid,
    pub edits: Uid,
    pub notification: Uid,
}

/// Value UIDs: severities, notification kinds, declaration and syntax
/// kinds consumed by the translation tables.
#[derive(Debug)]
pub struct Values {
    pub diag_error: Uid,
    pub diag_warning: Uid,
    pub notification_document_update: Uid,

    pub syntax_comment: Uid,
    pub syntax_comment_marker: Uid,
    pub syntax_comment_url: Uid,
    pub syntax_doccomment: Uid,
    pub syntax_doccomment_field: Uid,

    pub decl_class: Uid,
    pub decl_struct: Uid,
    pub decl_enum: Uid,
    pub decl_enumelement: Uid,
    pub decl_protocol: Uid,
    pub decl_associatedtype: Uid,
    pub decl_generic_type_param: Uid,
    pub decl_typealias: Uid,
    pub decl_extension: Uid,
    pub decl_constructor: Uid,
    pub decl_method_static: Uid,
    pub decl_method_class: Uid,
    pub decl_method_instance: Uid,
    pub decl_operator_prefix: Uid,
    pub decl_operator_postfix: Uid,
    pub decl_operator_infix: Uid,
    pub decl_function_free: Uid,
    pub decl_var_static: Uid,
    pub decl_var_class: Uid,
    pub decl_var_instance: Uid,
    pub decl_var_local: Uid,
    pub decl_var_global: Uid,
    pub decl_var_parameter: Uid,
    pub decl_module: Uid,
    pub keyword: Uid,
}

#[derive(Debug)]
pub struct UidTables {
    pub requests: Requests,
    pub keys: Keys,
    pub values: Values,
}

/// The process-wide UID tables, interned on first use.
pub fn tables() -> &'static UidTables {
    static TABLES: OnceLock<UidTables> = OnceLock::new();
    TABLES.get_or_init(|| UidTables {
        requests: Requests {
            editor_open: Uid::intern("source.request.editor.open"),
            editor_close: Uid::intern("source.request.editor.close"),
            editor_replacetext: Uid::intern("source.request.editor.replacetext"),
            codecomplete: Uid::intern("source.request.codecomplete"),
            cursorinfo: Uid::intern("source.request.cursorinfo"),
            relatedidents: Uid::intern("source.request.relatedidents"),
            semantic_refactoring: Uid::intern("source.request.semantic.refactoring"),
        },
        keys: Keys {
            request: Uid::intern("key.request"),
            name: Uid::intern("key.name"),
            sourcefile: Uid::intern("key.sourcefile"),
            sourcetext: Uid::intern("key.sourcetext"),
            compilerargs: Uid::intern("key.compilerargs"),
            offset: Uid::intern("key.offset"),
            length: Uid::intern("key.length"),
            nameoffset: Uid::intern("key.nameoffset"),
            namelength: Uid::intern("key.namelength"),
            bodyoffset: Uid::intern("key.bodyoffset"),
            bodylength: Uid::intern("key.bodylength"),
            kind: Uid::intern("key.kind"),
            severity: Uid::intern("key.severity"),
            description: Uid::intern("key.description"),
            diagnostics: Uid::intern("key.diagnostics"),
            results: Uid::intern("key.results"),
            substructure: Uid::intern("key.substructure"),
            syntaxmap: Uid::intern("key.syntaxmap"),
            typename: Uid::intern("key.typename"),
            usr: Uid::intern("key.usr"),
            annotated_decl: Uid::intern("key.annotated_decl"),
            doc_full_as_xml: Uid::intern("key.doc.full_as_xml"),
            enablesyntaxmap: Uid::intern("key.enablesyntaxmap"),
            enablesubstructure: Uid::intern("key.enablesubstructure"),
            syntactic_only: Uid::intern("key.syntactic_only"),
            line: Uid::intern("key.line"),
            column: Uid::intern("key.column"),
            endline: Uid::intern("key.endline"),
            endcolumn: Uid::intern("key.endcolumn"),
            text: Uid::intern("key.text"),
            actionuid: Uid::intern("key.actionuid"),
            actionname: Uid::intern("key.actionname"),
            retrieve_refactor_actions: Uid::intern("key.retrieve_refactor_actions"),
            refactor_actions: Uid::intern("key.refactor_actions"),
            categorizededits: Uid::intern("key.categorizededits"),
            edits: Uid::intern("key.edits"),
            notification: Uid::intern("key.notification"),
        },
        values: Values {
            diag_error: Uid::intern("source.diagnostic.severity.error"),
            diag_warning: Uid::intern("source.diagnostic.severity.warning"),
            notification_document_update: Uid::intern("source.notification.editor.documentupdate"),

            syntax_comment: Uid::intern("source.lang.swift.syntaxtype.comment"),
            syntax_comment_marker: Uid::intern("source.lang.swift.syntaxtype.comment.mark"),
            syntax_comment_url: Uid::intern("source.lang.swift.syntaxtype.comment.url"),
            syntax_doccomment: Uid::intern("source.lang.swift.syntaxtype.doccomment"),
            syntax_doccomment_field: Uid::intern("source.lang.swift.syntaxtype.doccomment.field"),

            decl_class: Uid::intern("source.lang.swift.decl.class"),
            decl_struct: Uid::intern("source.lang.swift.decl.struct"),
            decl_enum: Uid::intern("source.lang.swift.decl.enum"),
            decl_enumelement: Uid::intern("source.lang.swift.decl.enumelement"),
            decl_protocol: Uid::intern("source.lang.swift.decl.protocol"),
            decl_associatedtype: Uid::intern("source.lang.swift.decl.associatedtype"),
            decl_generic_type_param: Uid::intern("source.lang.swift.decl.generic_type_param"),
            decl_typealias: Uid::intern("source.lang.swift.decl.typealias"),
            decl_extension: Uid::intern("source.lang.swift.decl.extension"),
            decl_constructor: Uid::intern("source.lang.swift.decl.function.constructor"),
            decl_method_static: Uid::intern("source.lang.swift.decl.function.method.static"),
            decl_method_class: Uid::intern("source.lang.swift.decl.function.method.class"),
            decl_method_instance: Uid::intern("source.lang.swift.decl.function.method.instance"),
            decl_operator_prefix: Uid::intern("source.lang.swift.decl.function.operator.prefix"),
            decl_operator_postfix: Uid::intern("source.lang.swift.decl.function.operator.postfix"),
            decl_operator_infix: Uid::intern("source.lang.swift.decl.function.operator.infix"),
            decl_function_free: Uid::intern("source.lang.swift.decl.function.free"),
            decl_var_static: Uid::intern("source.lang.swift.decl.var.static"),
            decl_var_class: Uid::intern("source.lang.swift.decl.var.class"),
            decl_var_instance: Uid::intern("source.lang.swift.decl.var.instance"),
            decl_var_local: Uid::intern("source.lang.swift.decl.var.local"),
            decl_var_global: Uid::intern("source.lang.swift.decl.var.global"),
            decl_var_parameter: Uid::intern("source.lang.swift.decl.var.parameter"),
            decl_module: Uid::intern("source.lang.swift.decl.module"),
            keyword: Uid::intern("source.lang.swift.keyword"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_shared() {
        let a = tables();
        let b = tables();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_request_spellings() {
        let t = tables();
        assert_eq!(t.requests.editor_open.as_str(), "source.request.editor.open");
        assert_eq!(
            t.requests.editor_replacetext.as_str(),
            "source.request.editor.replacetext"
        );
        assert_eq!(
            t.requests.semantic_refactoring.as_str(),
            "source.request.semantic.refactoring"
        );
    }

    #[test]
    fn test_key_spellings() {
        let t = tables();
        assert_eq!(t.keys.offset.as_str(), "key.offset");
        assert_eq!(t.keys.doc_full_as_xml.as_str(), "key.doc.full_as_xml");
        assert_eq!(t.keys.syntactic_only.as_str(), "key.syntactic_only");
    }

    #[test]
    fn test_severity_values_distinct() {
        let t = tables();
        assert_ne!(t.values.diag_error, t.values.diag_warning);
    }
}
