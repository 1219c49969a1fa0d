//! Rules for the C# 11.0 bucket.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::semantic::normalize_type;
use crate::syntax::{NodeId, NodeKind};

use super::{expression_children, Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::PropertyDeclaration => {
            if tree.has_modifier(node, "required") {
                out.bump(CsVersion::V11_0, counters::REQUIRED_MEMBERS)?;
            }
        }
        NodeKind::FieldDeclaration => required_fields(ctx, node, out)?,
        NodeKind::UnsignedRightShiftExpression
        | NodeKind::UnsignedRightShiftAssignmentExpression => {
            out.bump(CsVersion::V11_0, counters::UNSIGNED_RIGHT_SHIFT)?;
        }
        NodeKind::LiteralExpression => {
            utf8_string_literals(ctx, node, out)?;
            raw_string_literals(ctx, node, out)?;
        }
        NodeKind::SwitchStatement => span_pattern_matching(ctx, node, out)?,
        NodeKind::OperatorDeclaration => checked_operators(ctx, node, out)?,
        NodeKind::StructDeclaration => auto_default_structs(ctx, node, out)?,
        NodeKind::ListPattern => {
            out.bump(CsVersion::V11_0, counters::LIST_PATTERNS)?;
        }
        NodeKind::Attribute => {
            nameof_in_attributes(ctx, node, out)?;
            generic_attributes(ctx, node, out)?;
        }
        _ => {}
    }
    if tree.kind(node).is_type_declaration() && tree.has_modifier(node, "file") {
        out.bump(CsVersion::V11_0, counters::FILE_LOCAL_TYPES)?;
    }
    Ok(())
}

/// `required` fields, once per declarator.
fn required_fields(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if !tree.has_modifier(node, "required") {
        return Ok(());
    }
    let Some(decl) = tree.child_of_kind(node, NodeKind::VariableDeclaration) else {
        return Ok(());
    };
    for _ in tree.children_of_kind(decl, NodeKind::VariableDeclarator) {
        out.bump(CsVersion::V11_0, counters::REQUIRED_MEMBERS)?;
    }
    Ok(())
}

/// String literals with the `u8` suffix.
fn utf8_string_literals(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    if ctx.tree.text(node).ends_with("u8") {
        out.bump(CsVersion::V11_0, counters::UTF8_STRING_LITERALS)?;
    }
    Ok(())
}

/// Triple-quoted raw string literals, plain or interpolated.
fn raw_string_literals(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let text = ctx.tree.text(node);
    if text.starts_with("\"\"\"") || text.starts_with("$\"\"\"") {
        out.bump(CsVersion::V11_0, counters::RAW_STRING_LITERALS)?;
    }
    Ok(())
}

/// Switching over an expression typed `ReadOnlySpan<char>`. Unresolved
/// scrutinee types are no match.
fn span_pattern_matching(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(scrutinee) = expression_children(tree, node).next() else {
        return Ok(());
    };
    let Some(ty) = ctx.model.expression_type(tree, scrutinee) else {
        return Ok(());
    };
    let ty = normalize_type(&ty);
    if ty == "ReadOnlySpan<char>" || ty == "System.ReadOnlySpan<char>" {
        out.bump(CsVersion::V11_0, counters::SPAN_PATTERN_MATCHING)?;
    }
    Ok(())
}

/// `operator checked ...` declarations.
fn checked_operators(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if tree.has_modifier(node, "checked") || tree.text(node).contains("operator checked") {
        out.bump(CsVersion::V11_0, counters::CHECKED_OPERATORS)?;
    }
    Ok(())
}

/// Structs relying on compiler-supplied default initialization: no
/// declared constructor at all.
fn auto_default_structs(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let has_ctor = tree
        .child_of_kind(node, NodeKind::ConstructorDeclaration)
        .is_some();
    if !has_ctor {
        out.bump(CsVersion::V11_0, counters::AUTO_DEFAULT_STRUCTS)?;
    }
    Ok(())
}

/// `nameof(...)` used inside an attribute's arguments.
fn nameof_in_attributes(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(args) = tree.child_of_kind(node, NodeKind::AttributeArgumentList) else {
        return Ok(());
    };
    for arg in tree.children_of_kind(args, NodeKind::AttributeArgument) {
        let has_nameof = tree.children(arg).iter().any(|&c| {
            tree.kind(c) == NodeKind::InvocationExpression
                && tree
                    .children(c)
                    .first()
                    .map(|&e| tree.kind(e) == NodeKind::IdentifierName && tree.text(e) == "nameof")
                    .unwrap_or(false)
        });
        if has_nameof {
            out.bump(CsVersion::V11_0, counters::NAMEOF_IN_ATTRIBUTES)?;
        }
    }
    Ok(())
}

/// Attributes whose name carries type arguments.
fn generic_attributes(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let generic_name = tree
        .first_type_child(node)
        .map(|n| tree.kind(n) == NodeKind::GenericName)
        .unwrap_or(false);
    if generic_name {
        out.bump(CsVersion::V11_0, counters::GENERIC_ATTRIBUTES)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::scan_tree;
    use crate::catalog::{counters, CsVersion};
    use crate::syntax::{NodeKind, TreeBuilder};

    #[test]
    fn file_local_types() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let c1 = b.child(root, NodeKind::ClassDeclaration, "file class Helper { }");
        b.child(c1, NodeKind::Modifier, "file");
        b.child(c1, NodeKind::IdentifierName, "Helper");
        let c2 = b.child(root, NodeKind::ClassDeclaration, "class Shared { }");
        b.child(c2, NodeKind::IdentifierName, "Shared");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(out.count(CsVersion::V11_0, counters::FILE_LOCAL_TYPES), Some(1));
    }

    #[test]
    fn required_property_and_fields() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let p = b.child(root, NodeKind::PropertyDeclaration, "required string Name { get; set; }");
        b.child(p, NodeKind::Modifier, "required");
        b.child(p, NodeKind::PredefinedType, "string");
        b.child(p, NodeKind::IdentifierName, "Name");
        let f = b.child(root, NodeKind::FieldDeclaration, "required int x, y;");
        b.child(f, NodeKind::Modifier, "required");
        let d = b.child(f, NodeKind::VariableDeclaration, "int x, y");
        b.child(d, NodeKind::PredefinedType, "int");
        let v1 = b.child(d, NodeKind::VariableDeclarator, "x");
        b.child(v1, NodeKind::IdentifierName, "x");
        let v2 = b.child(d, NodeKind::VariableDeclarator, "y");
        b.child(v2, NodeKind::IdentifierName, "y");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(out.count(CsVersion::V11_0, counters::REQUIRED_MEMBERS), Some(3));
    }

    #[test]
    fn utf8_and_raw_string_literals() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        b.child(root, NodeKind::LiteralExpression, "\"payload\"u8");
        b.child(root, NodeKind::LiteralExpression, "\"\"\"raw text\"\"\"");
        b.child(root, NodeKind::LiteralExpression, "\"plain\"");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(
            out.count(CsVersion::V11_0, counters::UTF8_STRING_LITERALS),
            Some(1)
        );
        assert_eq!(
            out.count(CsVersion::V11_0, counters::RAW_STRING_LITERALS),
            Some(1)
        );
    }

    #[test]
    fn span_switch_requires_resolved_scrutinee() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();

        // ReadOnlySpan<char> s; switch (s) { }
        let decl = b.child(root, NodeKind::VariableDeclaration, "ReadOnlySpan<char> s");
        b.child(decl, NodeKind::GenericName, "ReadOnlySpan<char>");
        let v = b.child(decl, NodeKind::VariableDeclarator, "s");
        b.child(v, NodeKind::IdentifierName, "s");

        let sw = b.child(root, NodeKind::SwitchStatement, "switch (s) { }");
        b.child(sw, NodeKind::IdentifierName, "s");

        let sw2 = b.child(root, NodeKind::SwitchStatement, "switch (other) { }");
        b.child(sw2, NodeKind::IdentifierName, "other");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(
            out.count(CsVersion::V11_0, counters::SPAN_PATTERN_MATCHING),
            Some(1)
        );
    }

    #[test]
    fn auto_default_struct_has_no_ctor() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let s1 = b.child(root, NodeKind::StructDeclaration, "struct Plain { int x; }");
        b.child(s1, NodeKind::IdentifierName, "Plain");
        let s2 = b.child(root, NodeKind::StructDeclaration, "struct Built { Built() { } }");
        b.child(s2, NodeKind::IdentifierName, "Built");
        let c = b.child(s2, NodeKind::ConstructorDeclaration, "Built() { }");
        b.child(c, NodeKind::IdentifierName, "Built");
        b.child(c, NodeKind::ParameterList, "()");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(
            out.count(CsVersion::V11_0, counters::AUTO_DEFAULT_STRUCTS),
            Some(1)
        );
    }

    #[test]
    fn nameof_and_generic_attributes() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();

        let al = b.child(root, NodeKind::AttributeList, "[NotNullIfNotNull(nameof(input))]");
        let a = b.child(al, NodeKind::Attribute, "NotNullIfNotNull(nameof(input))");
        b.child(a, NodeKind::IdentifierName, "NotNullIfNotNull");
        let args = b.child(a, NodeKind::AttributeArgumentList, "(nameof(input))");
        let arg = b.child(args, NodeKind::AttributeArgument, "nameof(input)");
        let inv = b.child(arg, NodeKind::InvocationExpression, "nameof(input)");
        b.child(inv, NodeKind::IdentifierName, "nameof");

        let al2 = b.child(root, NodeKind::AttributeList, "[Validator<string>]");
        let a2 = b.child(al2, NodeKind::Attribute, "Validator<string>");
        b.child(a2, NodeKind::GenericName, "Validator<string>");
        let tree = b.finish();

        let out = scan_tree(&tree);
        assert_eq!(
            out.count(CsVersion::V11_0, counters::NAMEOF_IN_ATTRIBUTES),
            Some(1)
        );
        assert_eq!(
            out.count(CsVersion::V11_0, counters::GENERIC_ATTRIBUTES),
            Some(1)
        );
    }
}
