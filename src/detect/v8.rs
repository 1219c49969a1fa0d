//! Rules for the C# 8.0 bucket.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::syntax::{NodeId, NodeKind};

use super::{Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::MethodDeclaration => {
            if tree.has_modifier(node, "readonly") {
                out.bump(CsVersion::V8_0, counters::READONLY_METHODS)?;
            }
        }
        NodeKind::PropertyDeclaration => {
            if tree.has_modifier(node, "readonly") {
                out.bump(CsVersion::V8_0, counters::READONLY_PROPERTIES)?;
            }
        }
        NodeKind::LocalFunctionStatement => {
            if tree.has_modifier(node, "static") {
                out.bump(CsVersion::V8_0, counters::STATIC_LOCAL_FUNCTIONS)?;
            }
        }
        NodeKind::StackAllocExpression => stackalloc_nested(ctx, node, out)?,
        NodeKind::InterpolatedStringExpression => alt_verbatim_strings(ctx, node, out)?,
        NodeKind::RangeExpression => {
            out.bump(CsVersion::V8_0, counters::RANGE_EXPRESSIONS)?;
        }
        NodeKind::IdentifierName => index_or_range_type(ctx, node, out)?,
        NodeKind::UsingStatement => {
            out.bump(CsVersion::V8_0, counters::ENHANCED_USING)?;
        }
        NodeKind::LocalDeclarationStatement => using_declaration(ctx, node, out)?,
        NodeKind::SwitchStatement => recursive_patterns(ctx, node, out)?,
        NodeKind::InterfaceDeclaration => default_interface_methods(ctx, node, out)?,
        _ => {}
    }
    Ok(())
}

/// `stackalloc` appearing inside another expression rather than directly in
/// a local declaration.
fn stackalloc_nested(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for ancestor in tree.ancestors(node) {
        if tree.kind(ancestor) == NodeKind::Block {
            break;
        }
        if tree.kind(ancestor).is_expression() {
            out.bump(CsVersion::V8_0, counters::STACKALLOC_NESTED)?;
            break;
        }
    }
    Ok(())
}

/// `@$"..."` and `$@"..."` spellings.
fn alt_verbatim_strings(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let text = ctx.tree.text(node);
    if text.starts_with("@$") || text.starts_with("$@") {
        out.bump(CsVersion::V8_0, counters::ALT_VERBATIM_STRINGS)?;
    }
    Ok(())
}

/// References to the `Index` and `Range` types by simple name.
fn index_or_range_type(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    match ctx.tree.text(node) {
        "Index" => out.bump(CsVersion::V8_0, counters::INDEX_TYPE)?,
        "Range" => out.bump(CsVersion::V8_0, counters::RANGE_TYPE)?,
        _ => {}
    }
    Ok(())
}

/// `using var x = ...;` declarations.
fn using_declaration(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    if ctx.tree.text(node).trim_start().starts_with("using ") {
        out.bump(CsVersion::V8_0, counters::ENHANCED_USING)?;
    }
    Ok(())
}

/// A switch with at least one case whose pattern nests a declaration
/// pattern. Counted at most once per switch.
fn recursive_patterns(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for descendant in tree.descendants(node) {
        if tree.kind(descendant) != NodeKind::CasePatternSwitchLabel {
            continue;
        }
        for &pattern in tree.children(descendant) {
            let nested = tree
                .descendants(pattern)
                .any(|d| tree.kind(d) == NodeKind::DeclarationPattern);
            if nested {
                out.bump(CsVersion::V8_0, counters::RECURSIVE_PATTERNS)?;
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Interface methods carrying a body.
fn default_interface_methods(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for method in tree.children_of_kind(node, NodeKind::MethodDeclaration) {
        if tree.child_of_kind(method, NodeKind::Block).is_some() {
            out.bump(CsVersion::V8_0, counters::DEFAULT_INTERFACE_METHODS)?;
        }
    }
    Ok(())
}
