//! Rules for the C# 7.1, 7.2 and 7.3 buckets.

use crate::catalog::{counters, CommitResult, CsVersion};
use crate::semantic::is_tuple_type;
use crate::syntax::{NodeId, NodeKind};

use super::{binary_operands, conditional_operands, Ctx, DetectError};

pub(super) fn scan(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    match tree.kind(node) {
        NodeKind::IsPatternExpression => {
            out.bump(CsVersion::V7_1, counters::PATTERN_MATCHING_GENERICS)?;
        }
        NodeKind::SimpleAssignmentExpression => inferred_tuple_names(ctx, node, out)?,
        NodeKind::DefaultExpression => {
            out.bump(CsVersion::V7_1, counters::DEFAULT_EXPRESSIONS)?;
        }
        NodeKind::LiteralExpression => {
            default_literal(ctx, node, out)?;
            digit_separators(ctx, node, out)?;
        }
        NodeKind::MethodDeclaration => async_main(ctx, node, out)?,
        NodeKind::InvocationExpression => non_trailing_named_arguments(ctx, node, out)?,
        NodeKind::ConditionalExpression => conditional_ref(ctx, node, out)?,
        NodeKind::Parameter => {
            in_parameters(ctx, node, out)?;
            in_modifier(ctx, node, out)?;
        }
        NodeKind::Argument => in_arguments(ctx, node, out)?,
        NodeKind::StructDeclaration => {
            ref_or_readonly_struct(ctx, node, out)?;
            expanded_fixed_buffers(ctx, node, out)?;
        }
        NodeKind::VariableDeclaration => span_declarations(ctx, node, out)?,
        NodeKind::TypeParameterConstraintClause => unmanaged_constraint(ctx, node, out)?,
        NodeKind::EqualsExpression | NodeKind::NotEqualsExpression => {
            tuple_equality(ctx, node, out)?;
        }
        NodeKind::PropertyDeclaration => field_targeted_attributes(ctx, node, out)?,
        NodeKind::StackAllocExpression => stackalloc_initializers(ctx, node, out)?,
        NodeKind::ObjectInitializerExpression => expression_variables(ctx, node, out)?,
        _ => {}
    }
    if tree.kind(node).is_member_declaration() {
        private_protected(ctx, node, out)?;
    }
    Ok(())
}

/// 7.1: tuple assigned without explicit element names.
fn inferred_tuple_names(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let (_, rhs) = binary_operands(tree, node)?;
    if tree.kind(rhs) != NodeKind::TupleExpression {
        return Ok(());
    }
    let all_unnamed = tree
        .children_of_kind(rhs, NodeKind::Argument)
        .all(|arg| tree.child_of_kind(arg, NodeKind::NameColon).is_none());
    if all_unnamed {
        out.bump(CsVersion::V7_1, counters::INFERRED_TUPLE_NAMES)?;
    }
    Ok(())
}

/// 7.1: the bare `default` literal.
fn default_literal(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.text(node) == "default" {
        out.bump(CsVersion::V7_1, counters::DEFAULT_EXPRESSIONS)?;
    }
    Ok(())
}

/// 7.1: method returning a `Task`-shaped type.
fn async_main(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if let Some(ret) = tree.return_type(node) {
        if tree.text(ret).contains("Task") {
            out.bump(CsVersion::V7_1, counters::ASYNC_MAIN)?;
        }
    }
    Ok(())
}

/// 7.2: both access modifiers on one member.
fn private_protected(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if tree.has_modifier(node, "private") && tree.has_modifier(node, "protected") {
        out.bump(CsVersion::V7_2, counters::PRIVATE_PROTECTED)?;
    }
    Ok(())
}

/// 7.2: a named argument appearing after a positional one.
fn non_trailing_named_arguments(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(list) = tree.child_of_kind(node, NodeKind::ArgumentList) else {
        return Ok(());
    };
    let mut found_positional = false;
    for arg in tree.children_of_kind(list, NodeKind::Argument) {
        let named = tree.child_of_kind(arg, NodeKind::NameColon).is_some();
        if named {
            if found_positional {
                out.bump(CsVersion::V7_2, counters::NON_TRAILING_NAMED_ARGUMENTS)?;
                return Ok(());
            }
        } else {
            found_positional = true;
        }
    }
    Ok(())
}

/// 7.2: underscore grouping right after a binary or hex prefix.
fn digit_separators(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let text = ctx.tree.text(node);
    if text.contains("0b_") || text.contains("0x_") {
        out.bump(CsVersion::V7_2, counters::DIGIT_SEPARATORS)?;
    }
    Ok(())
}

/// 7.2: `cond ? ref a : ref b`.
fn conditional_ref(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let (_, when_true, when_false) = conditional_operands(tree, node)?;
    if tree.kind(when_true) == NodeKind::RefExpression
        && tree.kind(when_false) == NodeKind::RefExpression
    {
        out.bump(CsVersion::V7_2, counters::CONDITIONAL_REF)?;
    }
    Ok(())
}

/// 7.2: `in` parameter.
fn in_parameters(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.has_modifier(node, "in") {
        out.bump(CsVersion::V7_2, counters::IN_PARAMETERS)?;
    }
    Ok(())
}

/// 7.2: overlap counter fed by the same shape as [`in_parameters`].
fn in_modifier(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.has_modifier(node, "in") {
        out.bump(CsVersion::V7_2, counters::IN_MODIFIER)?;
    }
    Ok(())
}

/// 7.2: `in` argument at a call site.
fn in_arguments(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    if ctx.tree.has_modifier(node, "in") {
        out.bump(CsVersion::V7_2, counters::IN_ARGUMENTS)?;
    }
    Ok(())
}

/// 7.2: `ref struct` and `readonly struct` declarations.
fn ref_or_readonly_struct(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    if tree.has_modifier(node, "ref") {
        out.bump(CsVersion::V7_2, counters::REF_STRUCT)?;
    }
    if tree.has_modifier(node, "readonly") {
        out.bump(CsVersion::V7_2, counters::READONLY_STRUCT)?;
    }
    Ok(())
}

/// 7.2: locals declared as `Span<T>` or `ReadOnlySpan<T>`.
fn span_declarations(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let Some(ty) = tree.first_type_child(node) else {
        return Ok(());
    };
    if tree.kind(ty) != NodeKind::GenericName {
        return Ok(());
    }
    let base = tree.text(ty).split('<').next().unwrap_or("").trim();
    if base == "Span" || base == "ReadOnlySpan" {
        out.bump(CsVersion::V7_2, counters::SPAN_TYPES)?;
    }
    Ok(())
}

/// 7.3: `where T : unmanaged`.
fn unmanaged_constraint(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for constraint in tree.children_of_kind(node, NodeKind::TypeConstraint) {
        let named_unmanaged = tree
            .first_type_child(constraint)
            .map(|t| tree.kind(t) == NodeKind::IdentifierName && tree.text(t) == "unmanaged")
            .unwrap_or(false);
        if named_unmanaged {
            out.bump(CsVersion::V7_3, counters::UNMANAGED_CONSTRAINT)?;
        }
    }
    Ok(())
}

/// 7.3: `==`/`!=` where both operands resolve to tuple types. Unresolved
/// operands are no match.
fn tuple_equality(ctx: &Ctx<'_>, node: NodeId, out: &mut CommitResult) -> Result<(), DetectError> {
    let tree = ctx.tree;
    let (lhs, rhs) = binary_operands(tree, node)?;
    let both_tuples = matches!(
        (
            ctx.model.expression_type(tree, lhs),
            ctx.model.expression_type(tree, rhs)
        ),
        (Some(l), Some(r)) if is_tuple_type(&l) && is_tuple_type(&r)
    );
    if both_tuples {
        out.bump(CsVersion::V7_3, counters::TUPLE_EQUALITY)?;
    }
    Ok(())
}

/// 7.3: `[field: ...]` attribute lists on auto-properties.
fn field_targeted_attributes(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for list in tree.children_of_kind(node, NodeKind::AttributeList) {
        if !tree.text(list).contains("field:") {
            continue;
        }
        for _ in tree.children_of_kind(list, NodeKind::Attribute) {
            out.bump(CsVersion::V7_3, counters::FIELD_TARGETED_ATTRIBUTES)?;
        }
    }
    Ok(())
}

/// 7.3: `stackalloc int[] { ... }`.
fn stackalloc_initializers(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    if ctx
        .tree
        .child_of_kind(node, NodeKind::ArrayInitializerExpression)
        .is_some()
    {
        out.bump(CsVersion::V7_3, counters::STACKALLOC_INITIALIZERS)?;
    }
    Ok(())
}

/// 7.3: struct fields of the element types newly allowed in fixed-size
/// buffers. The `fixed` keyword itself is not checked; this mirrors the
/// published measurement.
fn expanded_fixed_buffers(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    const BUFFER_TYPES: [&str; 4] = ["bool", "char", "short", "ushort"];
    let tree = ctx.tree;
    for field in tree.children_of_kind(node, NodeKind::FieldDeclaration) {
        let Some(decl) = tree.child_of_kind(field, NodeKind::VariableDeclaration) else {
            continue;
        };
        let matches_buffer_type = tree
            .first_type_child(decl)
            .map(|t| BUFFER_TYPES.contains(&tree.text(t)))
            .unwrap_or(false);
        if matches_buffer_type {
            out.bump(CsVersion::V7_3, counters::EXPANDED_FIXED_BUFFERS)?;
        }
    }
    Ok(())
}

/// 7.3: object-initializer elements whose value is more than a plain
/// identifier or assignment.
fn expression_variables(
    ctx: &Ctx<'_>,
    node: NodeId,
    out: &mut CommitResult,
) -> Result<(), DetectError> {
    let tree = ctx.tree;
    for element in super::expression_children(tree, node) {
        let Some(&last) = tree.children(element).last() else {
            continue;
        };
        let kind = tree.kind(last);
        let plain = matches!(
            kind,
            NodeKind::IdentifierName
                | NodeKind::SimpleAssignmentExpression
                | NodeKind::AssignmentExpression
                | NodeKind::UnsignedRightShiftAssignmentExpression
        );
        if !plain {
            out.bump(CsVersion::V7_3, counters::EXPRESSION_VARIABLES_IN_INITIALIZERS)?;
        }
    }
    Ok(())
}
