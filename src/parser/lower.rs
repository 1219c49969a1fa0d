//! Lowering of tree-sitter C# grammar trees into the owned syntax model.
//!
//! The grammar tree is richer than the detectors need; lowering maps the
//! productions the rules inspect onto [`NodeKind`] and collapses everything
//! else to [`NodeKind::Other`], keeping the tree shape intact. Keyword
//! tokens from the modifier set are surfaced as [`NodeKind::Modifier`]
//! children so rules can query them uniformly. Body wrappers such as the
//! declaration list of a class are spliced away, leaving members as direct
//! children of their declaring type.

use anyhow::anyhow;
use tree_sitter::{Node as TsNode, Parser as TsParser};

use crate::syntax::{NodeId, NodeKind, SyntaxTree, TreeBuilder};

/// Keyword tokens surfaced as modifier nodes on their parent.
const MODIFIER_KEYWORDS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "sealed", "override",
    "virtual", "abstract", "partial", "async", "unsafe", "extern", "new", "volatile", "const",
    "ref", "out", "in", "this", "required", "file", "global", "checked", "fixed",
];

/// Parse one C# source text into the owned tree model. Parse errors inside
/// the file degrade to `Other` nodes rather than failing the file.
pub fn parse_source(source: &str) -> anyhow::Result<SyntaxTree> {
    let mut parser = TsParser::new();
    parser.set_language(&tree_sitter_c_sharp::LANGUAGE.into())?;
    let grammar_tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("tree-sitter produced no tree"))?;

    let mut builder = TreeBuilder::new(NodeKind::CompilationUnit, source);
    let root = builder.root();
    lower_children(
        &mut builder,
        root,
        NodeKind::CompilationUnit,
        grammar_tree.root_node(),
        source,
    );
    Ok(builder.finish())
}

fn lower_children(
    builder: &mut TreeBuilder,
    parent: NodeId,
    parent_kind: NodeKind,
    grammar_node: TsNode<'_>,
    source: &str,
) {
    for i in 0..grammar_node.child_count() {
        let Some(child) = grammar_node.child(i) else {
            continue;
        };
        let line = child.start_position().row as u32 + 1;
        let text = node_text(child, source);

        if child.is_named() {
            match classify(child, source) {
                Lowered::Splice => {
                    lower_children(builder, parent, parent_kind, child, source);
                }
                Lowered::Node(kind) => {
                    let id = builder.child_at_line(parent, kind, text, line);
                    lower_children(builder, id, kind, child, source);
                }
            }
        } else if MODIFIER_KEYWORDS.contains(&text) {
            builder.child_at_line(parent, NodeKind::Modifier, text, line);
        } else if text == "=" && parent_kind == NodeKind::UsingDirective {
            // A using directive with an `=` token is an alias directive.
            builder.child_at_line(parent, NodeKind::NameEquals, text, line);
        }
    }
}

enum Lowered {
    Node(NodeKind),
    Splice,
}

fn classify(node: TsNode<'_>, source: &str) -> Lowered {
    let kind = match node.kind() {
        // Body wrappers: members become direct children of the declaration.
        "declaration_list" | "switch_body" => return Lowered::Splice,

        "using_directive" => NodeKind::UsingDirective,
        "name_equals" => NodeKind::NameEquals,
        "global_statement" => NodeKind::GlobalStatement,
        "namespace_declaration" => NodeKind::NamespaceDeclaration,
        "file_scoped_namespace_declaration" => NodeKind::FileScopedNamespaceDeclaration,

        "class_declaration" => NodeKind::ClassDeclaration,
        "struct_declaration" => NodeKind::StructDeclaration,
        "interface_declaration" => NodeKind::InterfaceDeclaration,
        "enum_declaration" => NodeKind::EnumDeclaration,
        "record_declaration" | "record_struct_declaration" => record_kind(node, source),
        "base_list" => NodeKind::BaseList,

        "method_declaration" => NodeKind::MethodDeclaration,
        "constructor_declaration" => NodeKind::ConstructorDeclaration,
        "operator_declaration" | "conversion_operator_declaration" => NodeKind::OperatorDeclaration,
        "property_declaration" => NodeKind::PropertyDeclaration,
        "field_declaration" => NodeKind::FieldDeclaration,
        "event_declaration" | "event_field_declaration" => NodeKind::EventDeclaration,
        "local_function_statement" => NodeKind::LocalFunctionStatement,

        "parameter_list" | "bracketed_parameter_list" => NodeKind::ParameterList,
        "parameter" => NodeKind::Parameter,
        "equals_value_clause" => NodeKind::EqualsValueClause,
        "type_parameter_constraints_clause" => NodeKind::TypeParameterConstraintClause,
        "type_parameter_constraint" | "type_constraint" => NodeKind::TypeConstraint,

        "attribute_list" => NodeKind::AttributeList,
        "attribute" => NodeKind::Attribute,
        "attribute_argument_list" => NodeKind::AttributeArgumentList,
        "attribute_argument" => NodeKind::AttributeArgument,

        "block" => NodeKind::Block,
        "local_declaration_statement" => NodeKind::LocalDeclarationStatement,
        "variable_declaration" => NodeKind::VariableDeclaration,
        "variable_declarator" => NodeKind::VariableDeclarator,
        "using_statement" => NodeKind::UsingStatement,
        "foreach_statement" | "for_each_statement" => NodeKind::ForEachStatement,
        "switch_statement" => NodeKind::SwitchStatement,
        "switch_section" => NodeKind::SwitchSection,
        "case_pattern_switch_label" => NodeKind::CasePatternSwitchLabel,

        "declaration_pattern" => NodeKind::DeclarationPattern,
        "recursive_pattern" | "property_pattern_clause" => NodeKind::RecursivePattern,
        "list_pattern" => NodeKind::ListPattern,

        "assignment_expression" => assignment_kind(node, source),
        "binary_expression" => binary_kind(node, source),
        "conditional_expression" => NodeKind::ConditionalExpression,
        "ref_expression" => NodeKind::RefExpression,
        "invocation_expression" => NodeKind::InvocationExpression,
        "argument_list" => NodeKind::ArgumentList,
        "argument" => NodeKind::Argument,
        "name_colon" => NodeKind::NameColon,
        "tuple_expression" => NodeKind::TupleExpression,

        "integer_literal" | "real_literal" | "boolean_literal" | "character_literal"
        | "string_literal" | "verbatim_string_literal" | "raw_string_literal" | "null_literal"
        | "literal_expression" | "default_literal" => NodeKind::LiteralExpression,

        "interpolated_string_expression" => NodeKind::InterpolatedStringExpression,
        "default_expression" => NodeKind::DefaultExpression,
        "is_pattern_expression" => NodeKind::IsPatternExpression,
        "declaration_expression" => NodeKind::DeclarationExpression,
        "stackalloc_expression" | "stack_alloc_array_creation_expression" => {
            NodeKind::StackAllocExpression
        }
        "initializer_expression" => initializer_kind(node),
        "object_creation_expression" => NodeKind::ObjectCreationExpression,
        "implicit_object_creation_expression" => NodeKind::ImplicitObjectCreationExpression,
        "collection_expression" => NodeKind::CollectionExpression,
        "range_expression" => NodeKind::RangeExpression,
        "member_access_expression" => NodeKind::MemberAccessExpression,
        "lambda_expression" => lambda_kind(node),

        "identifier" => NodeKind::IdentifierName,
        "generic_name" => NodeKind::GenericName,
        "qualified_name" => NodeKind::QualifiedName,
        "predefined_type" => NodeKind::PredefinedType,
        "tuple_type" => NodeKind::TupleType,
        "function_pointer_type" => NodeKind::FunctionPointerType,
        "array_type" | "nullable_type" | "pointer_type" | "ref_type" | "scoped_type"
        | "alias_qualified_name" => NodeKind::OtherType,

        "modifier" => NodeKind::Modifier,

        _ => NodeKind::Other,
    };
    Lowered::Node(kind)
}

/// Anonymous keyword/operator tokens directly under a node.
fn anon_tokens<'s>(node: TsNode<'_>, source: &'s str) -> Vec<&'s str> {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .filter(|c| !c.is_named())
        .map(|c| node_text(c, source))
        .collect()
}

fn node_text<'s>(node: TsNode<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn record_kind(node: TsNode<'_>, source: &str) -> NodeKind {
    if node.kind() == "record_struct_declaration" || anon_tokens(node, source).contains(&"struct") {
        NodeKind::RecordStructDeclaration
    } else {
        NodeKind::RecordDeclaration
    }
}

fn assignment_kind(node: TsNode<'_>, source: &str) -> NodeKind {
    let tokens = anon_tokens(node, source);
    if tokens.contains(&"=") {
        NodeKind::SimpleAssignmentExpression
    } else if tokens.contains(&">>>=") {
        NodeKind::UnsignedRightShiftAssignmentExpression
    } else {
        NodeKind::AssignmentExpression
    }
}

fn binary_kind(node: TsNode<'_>, source: &str) -> NodeKind {
    let tokens = anon_tokens(node, source);
    if tokens.contains(&"==") {
        NodeKind::EqualsExpression
    } else if tokens.contains(&"!=") {
        NodeKind::NotEqualsExpression
    } else if tokens.contains(&">>>") {
        NodeKind::UnsignedRightShiftExpression
    } else {
        NodeKind::BinaryExpression
    }
}

/// Both lambda spellings share one grammar production; a parameter list
/// child marks the parenthesized form.
fn lambda_kind(node: TsNode<'_>) -> NodeKind {
    for i in 0..node.child_count() {
        if let Some(c) = node.child(i) {
            if c.kind() == "parameter_list" {
                return NodeKind::ParenthesizedLambdaExpression;
            }
        }
    }
    NodeKind::SimpleLambdaExpression
}

/// Initializer braces appear under both object creation and array-shaped
/// allocations; the parent decides which detector family sees them.
fn initializer_kind(node: TsNode<'_>) -> NodeKind {
    let parent_kind = node.parent().map(|p| p.kind().to_string()).unwrap_or_default();
    if parent_kind.contains("stackalloc")
        || parent_kind.contains("stack_alloc")
        || parent_kind.contains("array_creation")
    {
        NodeKind::ArrayInitializerExpression
    } else {
        NodeKind::ObjectInitializerExpression
    }
}
