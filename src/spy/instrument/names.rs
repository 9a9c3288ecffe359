//! File-level unique names for generated bindings

use std::collections::HashSet;

use crate::spy::syntax::ast::{Expr, Imported, Module, Param, Statement};
use crate::spy::syntax::visit::{walk_expr, walk_statement, VisitMut};

use super::options::InstrumentOptions;

/// The bindings one instrumented module declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNames {
    pub file_name: String,
    pub stack: String,
    pub record_as_parent: String,
    pub record_expression: String,
}

impl GeneratedNames {
    /// Pick names that no identifier in `module` already uses
    pub fn for_module(module: &mut Module, options: &InstrumentOptions) -> Self {
        let mut taken = IdentifierCollector::default();
        taken.visit_mut_module(module);
        let mut taken = taken.names;

        let mut pick = |base: &str| {
            let name = unique_name(base, &taken);
            taken.insert(name.clone());
            name
        };

        Self {
            file_name: pick(&options.file_name_binding),
            stack: pick(&options.stack_binding),
            record_as_parent: pick(&options.record_as_parent_binding),
            record_expression: pick(&options.record_expression_binding),
        }
    }
}

pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[derive(Default)]
struct IdentifierCollector {
    names: HashSet<String>,
}

impl VisitMut for IdentifierCollector {
    fn visit_mut_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Import(import) => {
                for binding in &import.bindings {
                    self.names.insert(binding.local.clone());
                    if let Imported::Named(imported) = &binding.imported {
                        self.names.insert(imported.clone());
                    }
                }
            }
            Statement::Const(decl) => {
                self.names.insert(decl.name.clone());
            }
            _ => {}
        }
        walk_statement(self, statement);
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Ident(name) => {
                self.names.insert(name.clone());
            }
            Expr::Arrow(function) => {
                for param in &function.params {
                    match param {
                        Param::Ident(name) => {
                            self.names.insert(name.clone());
                        }
                        Param::Destructure(names) => self.names.extend(names.iter().cloned()),
                    }
                }
            }
            Expr::Location(location) => {
                self.names.insert(location.file.clone());
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spy::syntax::parser::parse_module;

    #[test]
    fn test_unique_name_suffixes() {
        let taken: HashSet<String> = ["a", "a_1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_name("a", &taken), "a_2");
        assert_eq!(unique_name("b", &taken), "b");
    }

    #[test]
    fn test_avoids_existing_bindings_and_references() {
        let mut module = parse_module(
            "const __jsxFileName = 1\nexport const c = (wcs_expression_stack) => wcs_wrap_source",
        )
        .expect("parses");
        let names = GeneratedNames::for_module(&mut module, &InstrumentOptions::default());
        assert_eq!(names.file_name, "__jsxFileName_1");
        assert_eq!(names.stack, "wcs_expression_stack_1");
        assert_eq!(names.record_as_parent, "wcs_wrap_source_1");
        assert_eq!(names.record_expression, "wcs_wrap_expression");
    }
}
