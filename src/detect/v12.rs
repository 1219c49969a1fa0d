//! Rules for the C# 12.0 bucket.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::syntax::{NodeId, NodeKind};

use super::{attribute_names, Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::MethodDeclaration => ref_readonly_parameters(ctx, node, out)?,
        NodeKind::CollectionExpression => {
            out.bump(CsVersion::V12_0, counters::COLLECTION_EXPRESSIONS)?;
        }
        NodeKind::StructDeclaration => {
            inline_arrays(ctx, node, out)?;
            if tree.child_of_kind(node, NodeKind::ParameterList).is_some() {
                out.bump(CsVersion::V12_0, counters::PRIMARY_CONSTRUCTORS)?;
            }
        }
        NodeKind::ClassDeclaration => {
            if tree.child_of_kind(node, NodeKind::ParameterList).is_some() {
                out.bump(CsVersion::V12_0, counters::PRIMARY_CONSTRUCTORS)?;
            }
        }
        NodeKind::InvocationExpression => nameof_invocations(ctx, node, out)?,
        NodeKind::UsingDirective => {
            if tree.child_of_kind(node, NodeKind::NameEquals).is_some() {
                out.bump(CsVersion::V12_0, counters::USING_ALIASES)?;
            }
        }
        NodeKind::ParenthesizedLambdaExpression => lambda_optional_parameters(ctx, node, out)?,
        _ => {}
    }
    Ok(())
}

/// `ref readonly` parameters on partial methods.
fn ref_readonly_parameters(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if !tree.has_modifier(node, "partial") {
        return Ok(());
    }
    let Some(params) = tree.child_of_kind(node, NodeKind::ParameterList) else {
        return Ok(());
    };
    for p in tree.children_of_kind(params, NodeKind::Parameter) {
        if tree.has_modifier(p, "ref") && tree.has_modifier(p, "readonly") {
            out.bump(CsVersion::V12_0, counters::REF_READONLY_PARAMETERS)?;
        }
    }
    Ok(())
}

/// `[InlineArray(...)]` structs.
fn inline_arrays(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    for (_, name) in attribute_names(ctx.tree, node) {
        if name == "InlineArray" {
            out.bump(CsVersion::V12_0, counters::INLINE_ARRAYS)?;
        }
    }
    Ok(())
}

/// Direct `nameof(...)` invocations.
fn nameof_invocations(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let is_nameof = tree
        .children(node)
        .first()
        .map(|&c| tree.kind(c) == NodeKind::IdentifierName && tree.text(c) == "nameof")
        .unwrap_or(false);
    if is_nameof {
        out.bump(CsVersion::V12_0, counters::NAMEOF_INSTANCE_MEMBERS)?;
    }
    Ok(())
}

/// Lambda parameters carrying default values.
fn lambda_optional_parameters(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(params) = tree.child_of_kind(node, NodeKind::ParameterList) else {
        return Ok(());
    };
    for p in tree.children_of_kind(params, NodeKind::Parameter) {
        if tree.child_of_kind(p, NodeKind::EqualsValueClause).is_some() {
            out.bump(CsVersion::V12_0, counters::LAMBDA_OPTIONAL_PARAMETERS)?;
        }
    }
    Ok(())
}
