//! Display names and parsing for LSP symbol kinds.

use lsp_types::SymbolKind;

/// Every kind the protocol defines, indexed by `number - 1`.
const KINDS: [(SymbolKind, &str); 26] = [
    (SymbolKind::FILE, "File"),
    (SymbolKind::MODULE, "Module"),
    (SymbolKind::NAMESPACE, "Namespace"),
    (SymbolKind::PACKAGE, "Package"),
    (SymbolKind::CLASS, "Class"),
    (SymbolKind::METHOD, "Method"),
    (SymbolKind::PROPERTY, "Property"),
    (SymbolKind::FIELD, "Field"),
    (SymbolKind::CONSTRUCTOR, "Constructor"),
    (SymbolKind::ENUM, "Enum"),
    (SymbolKind::INTERFACE, "Interface"),
    (SymbolKind::FUNCTION, "Function"),
    (SymbolKind::VARIABLE, "Variable"),
    (SymbolKind::CONSTANT, "Constant"),
    (SymbolKind::STRING, "String"),
    (SymbolKind::NUMBER, "Number"),
    (SymbolKind::BOOLEAN, "Boolean"),
    (SymbolKind::ARRAY, "Array"),
    (SymbolKind::OBJECT, "Object"),
    (SymbolKind::KEY, "Key"),
    (SymbolKind::NULL, "Null"),
    (SymbolKind::ENUM_MEMBER, "EnumMember"),
    (SymbolKind::STRUCT, "Struct"),
    (SymbolKind::EVENT, "Event"),
    (SymbolKind::OPERATOR, "Operator"),
    (SymbolKind::TYPE_PARAMETER, "TypeParameter"),
];

/// Human-readable name used in reports and overviews.
pub fn kind_name(kind: SymbolKind) -> &'static str {
    KINDS.iter().find(|(k, _)| *k == kind).map(|(_, name)| *name).unwrap_or("Unknown")
}

/// Parse a kind from its name (`class`, `enum_member`, `EnumMember`, `type-parameter`)
/// or from its protocol number (`5`).
pub fn parse_kind(text: &str) -> Option<SymbolKind> {
    let text = text.trim();
    if let Ok(number) = text.parse::<usize>() {
        return number.checked_sub(1).and_then(|idx| KINDS.get(idx)).map(|(kind, _)| *kind);
    }

    let wanted: String = text.chars().filter(|c| *c != '_' && *c != '-').flat_map(char::to_lowercase).collect();
    if wanted.is_empty() {
        return None;
    }
    KINDS.iter().find(|(_, name)| name.to_lowercase() == wanted).map(|(kind, _)| *kind)
}
