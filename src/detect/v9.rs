//! Rules for the C# 9.0 bucket.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::semantic::normalize_type;
use crate::syntax::{NodeId, NodeKind};

use super::{attribute_names, conditional_operands, expression_children, Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::ImplicitObjectCreationExpression => {
            out.bump(CsVersion::V9_0, counters::TARGET_TYPED_NEW)?;
        }
        NodeKind::Attribute => skip_locals_init(ctx, node, out)?,
        NodeKind::SimpleLambdaExpression | NodeKind::ParenthesizedLambdaExpression => {
            lambda_discards(ctx, node, out)?;
            static_lambdas(ctx, node, out)?;
        }
        NodeKind::VariableDeclaration => native_integers(ctx, node, out)?,
        NodeKind::LocalFunctionStatement => local_function_attributes(ctx, node, out)?,
        NodeKind::FunctionPointerType => {
            out.bump(CsVersion::V9_0, counters::FUNCTION_POINTERS)?;
        }
        NodeKind::RecordDeclaration | NodeKind::RecordStructDeclaration => {
            out.bump(CsVersion::V9_0, counters::RECORDS)?;
        }
        NodeKind::ConditionalExpression => target_typed_conditionals(ctx, node, out)?,
        NodeKind::MethodDeclaration => {
            covariant_returns(ctx, node, out)?;
            module_initializers(ctx, node, out)?;
        }
        NodeKind::ForEachStatement => extension_get_enumerator(ctx, node, out)?,
        NodeKind::GlobalStatement => {
            out.bump(CsVersion::V9_0, counters::TOP_LEVEL_STATEMENTS)?;
        }
        _ => {}
    }
    Ok(())
}

/// `[SkipLocalsInit]`.
fn skip_locals_init(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.text(node) == "SkipLocalsInit" {
        out.bump(CsVersion::V9_0, counters::SKIP_LOCALS_INIT)?;
    }
    Ok(())
}

/// A `_` parameter on a lambda. Counted once per lambda.
fn lambda_discards(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let discard = match tree.kind(node) {
        NodeKind::SimpleLambdaExpression => {
            tree.children_of_kind(node, NodeKind::Parameter)
                .any(|p| tree.declared_name(p) == Some("_"))
                || tree
                    .children_of_kind(node, NodeKind::IdentifierName)
                    .any(|c| tree.text(c) == "_")
        }
        _ => tree
            .child_of_kind(node, NodeKind::ParameterList)
            .map(|pl| {
                tree.children_of_kind(pl, NodeKind::Parameter)
                    .any(|p| tree.declared_name(p) == Some("_"))
            })
            .unwrap_or(false),
    };
    if discard {
        out.bump(CsVersion::V9_0, counters::LAMBDA_DISCARDS)?;
    }
    Ok(())
}

/// `static` lambdas of either spelling.
fn static_lambdas(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.has_modifier(node, "static") {
        out.bump(CsVersion::V9_0, counters::STATIC_LAMBDAS)?;
    }
    Ok(())
}

/// `nint`/`nuint` locals, once per declarator.
fn native_integers(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let native = tree
        .first_type_child(node)
        .map(|t| matches!(tree.text(t), "nint" | "nuint"))
        .unwrap_or(false);
    if !native {
        return Ok(());
    }
    for _ in tree.children_of_kind(node, NodeKind::VariableDeclarator) {
        out.bump(CsVersion::V9_0, counters::NATIVE_INTEGERS)?;
    }
    Ok(())
}

/// Attribute lists on local functions.
fn local_function_attributes(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    if ctx
        .tree
        .child_of_kind(node, NodeKind::AttributeList)
        .is_some()
    {
        out.bump(CsVersion::V9_0, counters::LOCAL_FUNCTION_ATTRIBUTES)?;
    }
    Ok(())
}

/// A conditional whose three operands are all literals.
fn target_typed_conditionals(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let (cond, when_true, when_false) = conditional_operands(tree, node)?;
    let all_literal = [cond, when_true, when_false]
        .iter()
        .all(|&id| tree.kind(id) == NodeKind::LiteralExpression);
    if all_literal {
        out.bump(CsVersion::V9_0, counters::TARGET_TYPED_CONDITIONALS)?;
    }
    Ok(())
}

/// An override whose return type matches the overridden method's, as far
/// as same-file facts can resolve the base.
fn covariant_returns(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(base) = ctx.model.overridden_method(tree, node) else {
        return Ok(());
    };
    let own = tree.return_type(node).map(|t| normalize_type(tree.text(t)));
    if own.is_some() && own == base.return_type {
        out.bump(CsVersion::V9_0, counters::COVARIANT_RETURNS)?;
    }
    Ok(())
}

/// `[ModuleInitializer]` methods.
fn module_initializers(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let has_attr = attribute_names(ctx.tree, node)
        .iter()
        .any(|(_, name)| name == "ModuleInitializer");
    if has_attr {
        out.bump(CsVersion::V9_0, counters::MODULE_INITIALIZERS)?;
    }
    Ok(())
}

/// `foreach` over a collection whose type acquires `GetEnumerator` through
/// an extension method. Unresolved collection types are no match.
fn extension_get_enumerator(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(collection) = expression_children(tree, node).last() else {
        return Ok(());
    };
    let Some(ty) = ctx.model.expression_type(tree, collection) else {
        return Ok(());
    };
    if ctx.model.has_extension_get_enumerator(&ty) {
        out.bump(CsVersion::V9_0, counters::EXTENSION_GET_ENUMERATOR)?;
    }
    Ok(())
}
