//! Best-effort per-file semantic facts.
//!
//! A [`SemanticModel`] is built once per file from the lowered syntax tree
//! and answers the handful of type/symbol questions some rules need:
//! declared variable and parameter types, override relationships between
//! methods declared in the same file, and extension-method registrations.
//!
//! Every query returns `Option`; failure to resolve a symbol is "no match",
//! never an error. Sampled commits routinely contain uncompilable snapshots,
//! so resolution beyond single-file scope is out of reach by design.

use std::collections::HashMap;

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// Facts about one method declared on a type in the current file.
#[derive(Debug, Clone)]
pub struct MethodFacts {
    pub name: String,
    pub return_type: Option<String>,
    pub is_override: bool,
}

/// Facts about one type declared in the current file.
#[derive(Debug, Clone)]
pub struct TypeFacts {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<MethodFacts>,
}

/// An extension method registration: `static R Name(this T receiver, ...)`.
#[derive(Debug, Clone)]
pub struct ExtensionMethod {
    pub name: String,
    pub receiver: String,
}

/// Read-only symbol/type facts for one file.
#[derive(Debug, Default)]
pub struct SemanticModel {
    var_types: HashMap<String, String>,
    types: HashMap<String, TypeFacts>,
    extensions: Vec<ExtensionMethod>,
}

/// Strip whitespace so `Span <int>` and `Span<int>` compare equal.
pub fn normalize_type(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether a normalized type name denotes a tuple.
pub fn is_tuple_type(ty: &str) -> bool {
    ty.starts_with('(')
        || ty.starts_with("ValueTuple<")
        || ty.starts_with("System.ValueTuple<")
        || ty.starts_with("Tuple<")
        || ty.starts_with("System.Tuple<")
}

impl SemanticModel {
    /// Collect facts from a lowered tree.
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut model = SemanticModel::default();
        model.visit(tree, tree.root());
        for id in tree.descendants(tree.root()) {
            model.visit(tree, id);
        }
        model
    }

    fn visit(&mut self, tree: &SyntaxTree, id: NodeId) {
        match tree.kind(id) {
            NodeKind::VariableDeclaration => self.collect_variables(tree, id),
            NodeKind::Parameter => self.collect_parameter(tree, id),
            k if k.is_type_declaration() => self.collect_type(tree, id),
            _ => {}
        }
    }

    fn collect_variables(&mut self, tree: &SyntaxTree, id: NodeId) {
        let declared = tree
            .first_type_child(id)
            .map(|t| normalize_type(tree.text(t)));

        for declarator in tree.children_of_kind(id, NodeKind::VariableDeclarator) {
            let Some(name) = tree.declared_name(declarator) else {
                continue;
            };
            let mut ty = declared.clone();
            // `var` resolves through the initializer when it is a tuple
            // literal; anything else stays unresolved.
            if ty.as_deref() == Some("var") {
                ty = initializer_tuple_type(tree, declarator);
            }
            if let Some(ty) = ty {
                self.var_types.insert(name.to_string(), ty);
            }
        }
    }

    fn collect_parameter(&mut self, tree: &SyntaxTree, id: NodeId) {
        let (Some(name), Some(ty)) = (tree.declared_name(id), tree.return_type(id)) else {
            return;
        };
        self.var_types
            .insert(name.to_string(), normalize_type(tree.text(ty)));
    }

    fn collect_type(&mut self, tree: &SyntaxTree, id: NodeId) {
        let Some(name) = tree.declared_name(id) else {
            return;
        };

        let bases = tree
            .child_of_kind(id, NodeKind::BaseList)
            .map(|bl| {
                tree.children(bl)
                    .iter()
                    .filter(|&&c| tree.kind(c).is_type_name())
                    .map(|&c| normalize_type(tree.text(c)))
                    .collect()
            })
            .unwrap_or_default();

        let methods: Vec<MethodFacts> = tree
            .children_of_kind(id, NodeKind::MethodDeclaration)
            .map(|m| MethodFacts {
                name: tree.declared_name(m).unwrap_or_default().to_string(),
                return_type: tree.return_type(m).map(|t| normalize_type(tree.text(t))),
                is_override: tree.has_modifier(m, "override"),
            })
            .collect();

        if tree.kind(id) == NodeKind::ClassDeclaration && tree.has_modifier(id, "static") {
            self.collect_extensions(tree, id);
        }

        self.types.insert(
            name.to_string(),
            TypeFacts {
                name: name.to_string(),
                bases,
                methods,
            },
        );
    }

    fn collect_extensions(&mut self, tree: &SyntaxTree, class: NodeId) {
        for method in tree.children_of_kind(class, NodeKind::MethodDeclaration) {
            if !tree.has_modifier(method, "static") {
                continue;
            }
            let Some(params) = tree.child_of_kind(method, NodeKind::ParameterList) else {
                continue;
            };
            let Some(first) = tree.child_of_kind(params, NodeKind::Parameter) else {
                continue;
            };
            if !tree.has_modifier(first, "this") {
                continue;
            }
            let (Some(name), Some(receiver)) =
                (tree.declared_name(method), tree.return_type(first))
            else {
                continue;
            };
            self.extensions.push(ExtensionMethod {
                name: name.to_string(),
                receiver: normalize_type(tree.text(receiver)),
            });
        }
    }

    /// Declared type of a variable or parameter, if seen.
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.var_types.get(name).map(String::as_str)
    }

    /// Static type of an expression node, as far as single-file facts
    /// allow: tuple literals type themselves, identifiers resolve through
    /// declarations, everything else is unresolved.
    pub fn expression_type(&self, tree: &SyntaxTree, id: NodeId) -> Option<String> {
        match tree.kind(id) {
            NodeKind::TupleExpression => Some(normalize_type(tree.text(id))),
            NodeKind::IdentifierName => self.variable_type(tree.text(id)).map(str::to_string),
            _ => None,
        }
    }

    /// Facts for a type declared in this file.
    pub fn type_facts(&self, name: &str) -> Option<&TypeFacts> {
        self.types.get(name)
    }

    /// The base-class method a declaration overrides, when both ends are
    /// declared in this file.
    pub fn overridden_method(&self, tree: &SyntaxTree, method: NodeId) -> Option<&MethodFacts> {
        if !tree.has_modifier(method, "override") {
            return None;
        }
        let name = tree.declared_name(method)?;
        let owner = tree
            .ancestors(method)
            .find(|&a| tree.kind(a).is_type_declaration())?;
        let owner_facts = self.types.get(tree.declared_name(owner)?)?;

        owner_facts
            .bases
            .iter()
            .filter_map(|base| self.types.get(base))
            .flat_map(|base| base.methods.iter())
            .find(|m| m.name == name && !m.is_override)
    }

    /// Whether any extension method named `GetEnumerator` targets the
    /// given (normalized) receiver type.
    pub fn has_extension_get_enumerator(&self, receiver: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.name == "GetEnumerator" && e.receiver == receiver)
    }
}

fn initializer_tuple_type(tree: &SyntaxTree, declarator: NodeId) -> Option<String> {
    let init = tree.child_of_kind(declarator, NodeKind::EqualsValueClause)?;
    let value = tree
        .children(init)
        .iter()
        .copied()
        .find(|&c| tree.kind(c).is_expression())?;
    if tree.kind(value) == NodeKind::TupleExpression {
        Some(normalize_type(tree.text(value)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;

    #[test]
    fn resolves_declared_variable_types() {
        // (int, int) pair = (1, 2); var inferred = (3, 4); string s = "x";
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();

        let decl = b.child(root, NodeKind::VariableDeclaration, "(int, int) pair = (1, 2)");
        b.child(decl, NodeKind::TupleType, "(int, int)");
        let d = b.child(decl, NodeKind::VariableDeclarator, "pair = (1, 2)");
        b.child(d, NodeKind::IdentifierName, "pair");

        let decl2 = b.child(root, NodeKind::VariableDeclaration, "var inferred = (3, 4)");
        b.child(decl2, NodeKind::IdentifierName, "var");
        let d2 = b.child(decl2, NodeKind::VariableDeclarator, "inferred = (3, 4)");
        b.child(d2, NodeKind::IdentifierName, "inferred");
        let eq = b.child(d2, NodeKind::EqualsValueClause, "= (3, 4)");
        b.child(eq, NodeKind::TupleExpression, "(3, 4)");

        let decl3 = b.child(root, NodeKind::VariableDeclaration, "string s = \"x\"");
        b.child(decl3, NodeKind::PredefinedType, "string");
        let d3 = b.child(decl3, NodeKind::VariableDeclarator, "s = \"x\"");
        b.child(d3, NodeKind::IdentifierName, "s");

        let tree = b.finish();
        let model = SemanticModel::build(&tree);

        assert_eq!(model.variable_type("pair"), Some("(int,int)"));
        assert_eq!(model.variable_type("inferred"), Some("(3,4)"));
        assert_eq!(model.variable_type("s"), Some("string"));
        assert!(is_tuple_type(model.variable_type("pair").unwrap()));
        assert!(!is_tuple_type(model.variable_type("s").unwrap()));
    }

    #[test]
    fn unresolved_identifiers_stay_unresolved() {
        let b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let tree = b.finish();
        let model = SemanticModel::build(&tree);
        assert_eq!(model.variable_type("ghost"), None);
    }

    #[test]
    fn finds_overridden_method_in_same_file() {
        // class Base { virtual Shape Outline() } class Derived : Base { override Shape Outline() }
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();

        let base = b.child(root, NodeKind::ClassDeclaration, "class Base");
        b.child(base, NodeKind::IdentifierName, "Base");
        let bm = b.child(base, NodeKind::MethodDeclaration, "virtual Shape Outline()");
        b.child(bm, NodeKind::Modifier, "virtual");
        b.child(bm, NodeKind::IdentifierName, "Shape");
        b.child(bm, NodeKind::IdentifierName, "Outline");
        b.child(bm, NodeKind::ParameterList, "()");

        let derived = b.child(root, NodeKind::ClassDeclaration, "class Derived : Base");
        b.child(derived, NodeKind::IdentifierName, "Derived");
        let bl = b.child(derived, NodeKind::BaseList, ": Base");
        b.child(bl, NodeKind::IdentifierName, "Base");
        let dm = b.child(derived, NodeKind::MethodDeclaration, "override Shape Outline()");
        b.child(dm, NodeKind::Modifier, "override");
        b.child(dm, NodeKind::IdentifierName, "Shape");
        b.child(dm, NodeKind::IdentifierName, "Outline");
        b.child(dm, NodeKind::ParameterList, "()");

        let tree = b.finish();
        let model = SemanticModel::build(&tree);

        let overridden = model.overridden_method(&tree, dm).unwrap();
        assert_eq!(overridden.name, "Outline");
        assert_eq!(overridden.return_type.as_deref(), Some("Shape"));

        // The base method itself overrides nothing.
        assert!(model.overridden_method(&tree, bm).is_none());
    }

    #[test]
    fn registers_extension_methods() {
        // static class Exts { static Walker GetEnumerator(this Grid g) }
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let class = b.child(root, NodeKind::ClassDeclaration, "static class Exts");
        b.child(class, NodeKind::Modifier, "static");
        b.child(class, NodeKind::IdentifierName, "Exts");
        let m = b.child(class, NodeKind::MethodDeclaration, "static Walker GetEnumerator(this Grid g)");
        b.child(m, NodeKind::Modifier, "static");
        b.child(m, NodeKind::IdentifierName, "Walker");
        b.child(m, NodeKind::IdentifierName, "GetEnumerator");
        let pl = b.child(m, NodeKind::ParameterList, "(this Grid g)");
        let p = b.child(pl, NodeKind::Parameter, "this Grid g");
        b.child(p, NodeKind::Modifier, "this");
        b.child(p, NodeKind::IdentifierName, "Grid");
        b.child(p, NodeKind::IdentifierName, "g");

        let tree = b.finish();
        let model = SemanticModel::build(&tree);

        assert!(model.has_extension_get_enumerator("Grid"));
        assert!(!model.has_extension_get_enumerator("List<int>"));
    }

    #[test]
    fn tuple_literals_type_themselves() {
        let mut b = TreeBuilder::new(NodeKind::CompilationUnit, "");
        let root = b.root();
        let t = b.child(root, NodeKind::TupleExpression, "(a, b)");
        let tree = b.finish();
        let model = SemanticModel::build(&tree);

        let ty = model.expression_type(&tree, t).unwrap();
        assert!(is_tuple_type(&ty));
    }
}
