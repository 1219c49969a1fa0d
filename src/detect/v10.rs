//! Rules for the C# 10.0 bucket.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::syntax::{NodeId, NodeKind};

use super::{attribute_names, binary_operands, Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::RecordStructDeclaration => {
            out.bump(CsVersion::V10_0, counters::RECORD_STRUCTS)?;
        }
        NodeKind::UsingDirective => {
            if tree.has_modifier(node, "global") {
                out.bump(CsVersion::V10_0, counters::GLOBAL_USINGS)?;
            }
        }
        NodeKind::FieldDeclaration => constant_interpolated_strings(ctx, node, out)?,
        NodeKind::RecordDeclaration => sealed_tostring_override(ctx, node, out)?,
        NodeKind::SimpleAssignmentExpression => mixed_deconstruction(ctx, node, out)?,
        NodeKind::MethodDeclaration => async_method_builder(ctx, node, out)?,
        NodeKind::InterfaceDeclaration => static_abstract_members(ctx, node, out)?,
        NodeKind::SimpleLambdaExpression | NodeKind::ParenthesizedLambdaExpression => {
            lambda_improvements(ctx, node, out)?;
        }
        NodeKind::FileScopedNamespaceDeclaration => {
            out.bump(CsVersion::V10_0, counters::FILE_SCOPED_NAMESPACES)?;
        }
        NodeKind::StructDeclaration => parameterless_struct_ctors(ctx, node, out)?,
        NodeKind::Parameter => caller_expression_attribute(ctx, node, out)?,
        _ => {}
    }
    Ok(())
}

/// `const` fields initialized with an interpolated string.
fn constant_interpolated_strings(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if !tree.has_modifier(node, "const") {
        return Ok(());
    }
    let Some(decl) = tree.child_of_kind(node, NodeKind::VariableDeclaration) else {
        return Ok(());
    };
    for declarator in tree.children_of_kind(decl, NodeKind::VariableDeclarator) {
        let interpolated = tree
            .child_of_kind(declarator, NodeKind::EqualsValueClause)
            .and_then(|eq| tree.child_of_kind(eq, NodeKind::InterpolatedStringExpression));
        if interpolated.is_some() {
            out.bump(CsVersion::V10_0, counters::CONSTANT_INTERPOLATED_STRINGS)?;
        }
    }
    Ok(())
}

/// Records declaring `sealed override ToString`.
fn sealed_tostring_override(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for method in tree.children_of_kind(node, NodeKind::MethodDeclaration) {
        if tree.declared_name(method) == Some("ToString")
            && tree.has_modifier(method, "sealed")
            && tree.has_modifier(method, "override")
        {
            out.bump(CsVersion::V10_0, counters::SEALED_TOSTRING_RECORDS)?;
        }
    }
    Ok(())
}

/// Tuple deconstruction mixing fresh declarations with existing variables,
/// e.g. `(x, int y) = point;`.
fn mixed_deconstruction(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let (lhs, _) = binary_operands(tree, node)?;
    if tree.kind(lhs) != NodeKind::TupleExpression {
        return Ok(());
    }
    let mut has_declaration = false;
    let mut has_identifier = false;
    for arg in tree.children_of_kind(lhs, NodeKind::Argument) {
        for &inner in tree.children(arg) {
            match tree.kind(inner) {
                NodeKind::DeclarationExpression => has_declaration = true,
                NodeKind::IdentifierName => has_identifier = true,
                _ => {}
            }
        }
    }
    if has_declaration && has_identifier {
        out.bump(CsVersion::V10_0, counters::MIXED_DECONSTRUCTION)?;
    }
    Ok(())
}

/// `[AsyncMethodBuilder(...)]` on a method, plain or qualified.
fn async_method_builder(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    for (_, name) in attribute_names(ctx.tree, node) {
        if name == "AsyncMethodBuilder" || name.ends_with(".AsyncMethodBuilder") {
            out.bump(CsVersion::V10_0, counters::ASYNC_METHOD_BUILDER)?;
        }
    }
    Ok(())
}

/// `static abstract` interface members, once per member.
fn static_abstract_members(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for &member in tree.children(node) {
        let member_like = matches!(
            tree.kind(member),
            NodeKind::MethodDeclaration | NodeKind::PropertyDeclaration | NodeKind::EventDeclaration
        );
        if member_like
            && tree.has_modifier(member, "static")
            && tree.has_modifier(member, "abstract")
        {
            out.bump(CsVersion::V10_0, counters::STATIC_ABSTRACT_INTERFACE_MEMBERS)?;
        }
    }
    Ok(())
}

/// Lambdas with an explicit return type or attribute lists.
fn lambda_improvements(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let has_attributes = tree.child_of_kind(node, NodeKind::AttributeList).is_some();

    // An explicit return type sits before the parameter list; type-shaped
    // nodes after it belong to the body.
    let mut explicit_return = false;
    for &c in tree.children(node) {
        if tree.kind(c) == NodeKind::ParameterList {
            break;
        }
        if tree.kind(c).is_type_name() {
            explicit_return = true;
            break;
        }
    }

    if has_attributes || (tree.kind(node) == NodeKind::ParenthesizedLambdaExpression && explicit_return)
    {
        out.bump(CsVersion::V10_0, counters::LAMBDA_IMPROVEMENTS)?;
    }
    Ok(())
}

/// Struct constructors with an empty parameter list.
fn parameterless_struct_ctors(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for ctor in tree.children_of_kind(node, NodeKind::ConstructorDeclaration) {
        let empty = tree
            .child_of_kind(ctor, NodeKind::ParameterList)
            .map(|pl| tree.children_of_kind(pl, NodeKind::Parameter).next().is_none())
            .unwrap_or(false);
        if empty {
            out.bump(CsVersion::V10_0, counters::PARAMETERLESS_STRUCT_CTORS)?;
        }
    }
    Ok(())
}

/// `[CallerArgumentExpression(...)]` on a parameter.
fn caller_expression_attribute(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    for (_, name) in attribute_names(ctx.tree, node) {
        if name.ends_with("CallerArgumentExpression") {
            out.bump(CsVersion::V10_0, counters::CALLER_EXPRESSION_ATTRIBUTE)?;
        }
    }
    Ok(())
}
