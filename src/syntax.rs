//! Owned syntax tree model.
//!
//! The parsing collaborator lowers a grammar tree into this arena-backed
//! representation; the detectors and the semantic model only ever see this
//! model. A node carries a kind from a closed enumeration, the source text
//! it spans, a parent link, and ordered children.
//!
//! Modifiers (`static`, `readonly`, `ref`, ...) are represented as child
//! nodes of kind [`NodeKind::Modifier`] whose text is the keyword, so the
//! detectors can ask for them uniformly regardless of which grammar
//! production carried the keyword.

/// Kinds of syntax nodes the detectors inspect. Everything else lowers to
/// [`NodeKind::Other`] and only participates as traversal structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,

    // Directives and namespaces
    UsingDirective,
    NameEquals,
    GlobalStatement,
    NamespaceDeclaration,
    FileScopedNamespaceDeclaration,

    // Type declarations
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    RecordDeclaration,
    RecordStructDeclaration,
    BaseList,

    // Members
    MethodDeclaration,
    ConstructorDeclaration,
    OperatorDeclaration,
    PropertyDeclaration,
    FieldDeclaration,
    EventDeclaration,
    LocalFunctionStatement,

    // Parameters and constraints
    ParameterList,
    Parameter,
    EqualsValueClause,
    TypeParameterConstraintClause,
    TypeConstraint,

    // Attributes
    AttributeList,
    Attribute,
    AttributeArgumentList,
    AttributeArgument,

    // Statements
    Block,
    LocalDeclarationStatement,
    VariableDeclaration,
    VariableDeclarator,
    UsingStatement,
    ForEachStatement,
    SwitchStatement,
    SwitchSection,
    CasePatternSwitchLabel,

    // Patterns
    DeclarationPattern,
    RecursivePattern,
    ListPattern,

    // Expressions
    SimpleAssignmentExpression,
    AssignmentExpression,
    EqualsExpression,
    NotEqualsExpression,
    UnsignedRightShiftExpression,
    UnsignedRightShiftAssignmentExpression,
    BinaryExpression,
    ConditionalExpression,
    RefExpression,
    InvocationExpression,
    ArgumentList,
    Argument,
    NameColon,
    TupleExpression,
    LiteralExpression,
    InterpolatedStringExpression,
    DefaultExpression,
    IsPatternExpression,
    DeclarationExpression,
    StackAllocExpression,
    ObjectInitializerExpression,
    ArrayInitializerExpression,
    ObjectCreationExpression,
    ImplicitObjectCreationExpression,
    CollectionExpression,
    RangeExpression,
    MemberAccessExpression,
    SimpleLambdaExpression,
    ParenthesizedLambdaExpression,

    // Type names
    IdentifierName,
    GenericName,
    QualifiedName,
    PredefinedType,
    TupleType,
    FunctionPointerType,
    OtherType,

    // Tokens surfaced as nodes
    Modifier,

    Other,
}

impl NodeKind {
    /// Shapes that can carry member modifiers (`private protected`,
    /// `required`, ...).
    pub fn is_member_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::MethodDeclaration
                | NodeKind::ConstructorDeclaration
                | NodeKind::OperatorDeclaration
                | NodeKind::PropertyDeclaration
                | NodeKind::FieldDeclaration
                | NodeKind::EventDeclaration
                | NodeKind::ClassDeclaration
                | NodeKind::StructDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::RecordStructDeclaration
        )
    }

    /// Class-like declarations (`file` can apply to these).
    pub fn is_type_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::StructDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::RecordStructDeclaration
        )
    }

    /// Nodes naming a type.
    pub fn is_type_name(&self) -> bool {
        matches!(
            self,
            NodeKind::IdentifierName
                | NodeKind::GenericName
                | NodeKind::QualifiedName
                | NodeKind::PredefinedType
                | NodeKind::TupleType
                | NodeKind::FunctionPointerType
                | NodeKind::OtherType
        )
    }

    /// Expression-valued nodes. Used for context checks such as
    /// "stackalloc nested inside another expression".
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::SimpleAssignmentExpression
                | NodeKind::AssignmentExpression
                | NodeKind::EqualsExpression
                | NodeKind::NotEqualsExpression
                | NodeKind::UnsignedRightShiftExpression
                | NodeKind::UnsignedRightShiftAssignmentExpression
                | NodeKind::BinaryExpression
                | NodeKind::ConditionalExpression
                | NodeKind::RefExpression
                | NodeKind::InvocationExpression
                | NodeKind::TupleExpression
                | NodeKind::LiteralExpression
                | NodeKind::InterpolatedStringExpression
                | NodeKind::DefaultExpression
                | NodeKind::IsPatternExpression
                | NodeKind::DeclarationExpression
                | NodeKind::StackAllocExpression
                | NodeKind::ObjectInitializerExpression
                | NodeKind::ArrayInitializerExpression
                | NodeKind::ObjectCreationExpression
                | NodeKind::ImplicitObjectCreationExpression
                | NodeKind::CollectionExpression
                | NodeKind::RangeExpression
                | NodeKind::MemberAccessExpression
                | NodeKind::SimpleLambdaExpression
                | NodeKind::ParenthesizedLambdaExpression
                | NodeKind::IdentifierName
                | NodeKind::GenericName
                | NodeKind::QualifiedName
        )
    }
}

/// Index of a node within its [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    text: String,
    line: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena-backed syntax tree. Node 0 is always the root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    /// The source text the node spans. For [`NodeKind::Modifier`] this is
    /// the keyword itself.
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].text
    }

    /// 1-indexed source line, 0 for synthetic trees.
    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.index()].line
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == kind)
    }

    pub fn children_of_kind<'a>(
        &'a self,
        id: NodeId,
        kind: NodeKind,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Modifier keywords present on a node, in declaration order.
    pub fn modifiers<'a>(&'a self, id: NodeId) -> impl Iterator<Item = &'a str> + 'a {
        self.children_of_kind(id, NodeKind::Modifier)
            .map(move |c| self.text(c))
    }

    pub fn has_modifier(&self, id: NodeId, keyword: &str) -> bool {
        self.modifiers(id).any(|m| m == keyword)
    }

    /// Walk towards the root, excluding the node itself.
    pub fn ancestors<'a>(&'a self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        let mut current = self.parent(id);
        std::iter::from_fn(move || {
            let next = current?;
            current = self.parent(next);
            Some(next)
        })
    }

    /// Pre-order descendants of a node, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// First child naming a type.
    pub fn first_type_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c).is_type_name())
    }

    /// Declared name of a type- or member-like node: the last plain
    /// identifier child before the parameter list (if any). A method's
    /// return type and name can both be identifiers; the name is the later
    /// one.
    pub fn declared_name(&self, id: NodeId) -> Option<&str> {
        let mut name = None;
        for &c in self.children(id) {
            match self.kind(c) {
                NodeKind::ParameterList | NodeKind::BaseList | NodeKind::Block => break,
                NodeKind::IdentifierName => name = Some(self.text(c)),
                _ => {}
            }
        }
        name
    }

    /// Return type of a method-like node: the first type-name child that is
    /// not its declared name.
    pub fn return_type(&self, id: NodeId) -> Option<NodeId> {
        let mut type_children: Vec<NodeId> = Vec::new();
        for &c in self.children(id) {
            if self.kind(c) == NodeKind::ParameterList {
                break;
            }
            if self.kind(c).is_type_name() {
                type_children.push(c);
            }
        }
        match type_children.len() {
            0 => None,
            // A lone identifier is the member name, not a return type,
            // unless it is an unambiguous type node.
            1 if self.kind(type_children[0]) == NodeKind::IdentifierName => None,
            _ => Some(type_children[0]),
        }
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for &c in self.tree.children(id).iter().rev() {
            self.stack.push(c);
        }
        Some(id)
    }
}

/// Incremental tree construction, used by the grammar lowering and by
/// tests that assemble shapes by hand.
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    /// Start a tree with the given root node.
    pub fn new(root_kind: NodeKind, root_text: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: root_kind,
                text: root_text.into(),
                line: 0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child to `parent` and return its id.
    pub fn child(&mut self, parent: NodeId, kind: NodeKind, text: impl Into<String>) -> NodeId {
        self.child_at_line(parent, kind, text, 0)
    }

    pub fn child_at_line(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        text: impl Into<String>,
        line: u32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            text: text.into(),
            line,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn finish(self) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes }
    }
}
