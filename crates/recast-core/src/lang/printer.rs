//! Canonical printer for the reference frontend
//!
//! Output is canonical: parsing the printed text yields an equivalent tree,
//! and printing that tree yields the same text. Change detection compares the
//! printed form of the mutated tree against the original source, so the
//! printer must be deterministic.

use super::SourcePrinter;
use crate::tree::{NodeId, NodeKind, SyntaxTree};
use crate::{RecastError, Result};

const INDENT: &str = "    ";

/// Prints a tree back to `.rcs` source
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptPrinter;

impl SourcePrinter for ScriptPrinter {
    fn print(&self, tree: &SyntaxTree) -> Result<String> {
        let root = tree
            .root()
            .ok_or_else(|| RecastError::tree_error("cannot print a tree without a root"))?;
        if tree.kind(root) != NodeKind::Module {
            return Err(RecastError::tree_error(format!(
                "expected Module at the root, found {:?}",
                tree.kind(root)
            )));
        }

        let mut out = String::new();
        for (i, &item) in tree.children(root).iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            print_item(tree, item, &mut out)?;
        }
        Ok(out)
    }
}

fn print_item(tree: &SyntaxTree, item: NodeId, out: &mut String) -> Result<()> {
    match tree.kind(item) {
        NodeKind::ClassDecl => {
            out.push_str("class ");
            out.push_str(node_text(tree, item)?);
            out.push_str(" {\n");
            for &member in tree.children(item) {
                out.push_str(INDENT);
                out.push_str("const ");
                out.push_str(node_text(tree, member)?);
                out.push_str(" = ");
                print_expr(tree, only_child(tree, member)?, 0, out)?;
                out.push_str(";\n");
            }
            out.push_str("}\n");
            Ok(())
        }
        NodeKind::FnDecl => {
            let children = tree.children(item);
            let [params, body] = children else {
                return Err(RecastError::tree_error(
                    "FnDecl must have a parameter list and a body",
                ));
            };
            out.push_str("fn ");
            out.push_str(node_text(tree, item)?);
            out.push('(');
            for (i, &param) in tree.children(*params).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(node_text(tree, param)?);
            }
            out.push_str(") {\n");
            for &stmt in tree.children(*body) {
                out.push_str(INDENT);
                print_stmt(tree, stmt, out)?;
            }
            out.push_str("}\n");
            Ok(())
        }
        _ => print_stmt(tree, item, out),
    }
}

fn print_stmt(tree: &SyntaxTree, stmt: NodeId, out: &mut String) -> Result<()> {
    match tree.kind(stmt) {
        NodeKind::EmptyStmt => out.push_str(";\n"),
        NodeKind::LetStmt => {
            out.push_str("let ");
            out.push_str(node_text(tree, stmt)?);
            out.push_str(" = ");
            print_expr(tree, only_child(tree, stmt)?, 0, out)?;
            out.push_str(";\n");
        }
        NodeKind::ReturnStmt => {
            out.push_str("return ");
            print_expr(tree, only_child(tree, stmt)?, 0, out)?;
            out.push_str(";\n");
        }
        NodeKind::ExprStmt => {
            print_expr(tree, only_child(tree, stmt)?, 0, out)?;
            out.push_str(";\n");
        }
        other => {
            return Err(RecastError::tree_error(format!(
                "unexpected {other:?} in statement position"
            )));
        }
    }
    Ok(())
}

/// `min_prec` is the binding strength required at this position; operands
/// weaker than it are parenthesized so the printed text reparses to the
/// same shape.
fn print_expr(tree: &SyntaxTree, expr: NodeId, min_prec: u8, out: &mut String) -> Result<()> {
    match tree.kind(expr) {
        NodeKind::IntLit | NodeKind::Ident => {
            out.push_str(node_text(tree, expr)?);
        }
        NodeKind::StringLit => {
            out.push('"');
            for c in node_text(tree, expr)?.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }
        NodeKind::ClassConstFetch => {
            let children = tree.children(expr);
            let [class, member] = children else {
                return Err(RecastError::tree_error(
                    "ClassConstFetch must have a class and a member",
                ));
            };
            out.push_str(node_text(tree, *class)?);
            out.push_str("::");
            out.push_str(node_text(tree, *member)?);
        }
        NodeKind::Call => {
            out.push_str(node_text(tree, expr)?);
            out.push('(');
            for (i, &arg) in tree.children(expr).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(tree, arg, 0, out)?;
            }
            out.push(')');
        }
        NodeKind::Binary => {
            let op = node_text(tree, expr)?;
            let prec = operator_precedence(op)?;
            let children = tree.children(expr);
            let [lhs, rhs] = children else {
                return Err(RecastError::tree_error("Binary must have two operands"));
            };

            let parens = prec < min_prec;
            if parens {
                out.push('(');
            }
            // Left-associative: the right operand needs strictly stronger
            // binding to avoid reassociation on reparse.
            print_expr(tree, *lhs, prec, out)?;
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            print_expr(tree, *rhs, prec + 1, out)?;
            if parens {
                out.push(')');
            }
        }
        other => {
            return Err(RecastError::tree_error(format!(
                "unexpected {other:?} in expression position"
            )));
        }
    }
    Ok(())
}

fn operator_precedence(op: &str) -> Result<u8> {
    match op {
        "+" => Ok(1),
        "*" => Ok(2),
        other => Err(RecastError::tree_error(format!(
            "unknown binary operator '{other}'"
        ))),
    }
}

fn node_text<'t>(tree: &'t SyntaxTree, id: NodeId) -> Result<&'t str> {
    tree.text(id).ok_or_else(|| {
        RecastError::tree_error(format!(
            "{:?} node is missing its text payload",
            tree.kind(id)
        ))
    })
}

fn only_child(tree: &SyntaxTree, id: NodeId) -> Result<NodeId> {
    match tree.children(id) {
        [child] => Ok(*child),
        other => Err(RecastError::tree_error(format!(
            "{:?} must have exactly one child, found {}",
            tree.kind(id),
            other.len()
        ))),
    }
}
