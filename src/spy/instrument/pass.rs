//! The instrumentation pass
//!
//! For every markup element the pass adds `__self={this}` and a `__source`
//! location attribute unless the author already wrote one. When the element
//! has significant text or `{expr}` children, the location goes through the
//! record-as-parent helper (a push onto the attribution stack) and each of
//! those children is replaced by a record-expression call, the last one
//! flagged so that it pops the stack again.
//!
//! An element with a user-written `__source` never pushes, so its children
//! are left alone; wrapping them would record into some unrelated ancestor and
//! pop an entry that was never pushed for them.
//!
//! The pass never fails. Anything it does not recognise is left as is.

use serde::Serialize;
use tracing::{debug, trace};

use crate::spy::syntax::ast::{Expr, JsxChild, JsxElement, JsxExprContainer, Module};
use crate::spy::syntax::visit::{walk_jsx_element, VisitMut};

use super::generators::{
    add_expression_helpers, add_file_name_const, record_expression_call, self_attribute,
    source_attribute, Locator,
};
use super::names::GeneratedNames;
use super::options::{InstrumentOptions, SELF_ATTRIBUTE, SOURCE_ATTRIBUTE};

/// What the pass did to one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentReport {
    pub elements_annotated: usize,
    pub texts_wrapped: usize,
    pub expressions_wrapped: usize,
    pub user_defined_kept: usize,
    pub file_constant_inserted: bool,
    pub helpers_inserted: bool,
}

impl InstrumentReport {
    pub fn children_wrapped(&self) -> usize {
        self.texts_wrapped + self.expressions_wrapped
    }
}

#[derive(Debug, Clone)]
pub struct Instrumented {
    pub module: Module,
    pub names: GeneratedNames,
    pub report: InstrumentReport,
}

/// Instrument a parsed module
///
/// `source` must be the text `module` was parsed from; locations are computed
/// from the byte ranges the parser recorded.
pub fn instrument(
    mut module: Module,
    source: &str,
    file_name: &str,
    options: &InstrumentOptions,
) -> Instrumented {
    let names = GeneratedNames::for_module(&mut module, options);

    let mut report = {
        let locator = Locator::new(source, &names.file_name, options.normalize_line_endings);
        let mut pass = Instrumenter {
            locator: &locator,
            names: &names,
            report: InstrumentReport::default(),
        };
        pass.visit_mut_module(&mut module);
        pass.report
    };

    if report.elements_annotated > 0 {
        add_file_name_const(&mut module, &names, file_name);
        report.file_constant_inserted = true;
    }
    if report.children_wrapped() > 0 {
        let after = usize::from(report.file_constant_inserted);
        add_expression_helpers(&mut module, &names, after);
        report.helpers_inserted = true;
    }

    debug!(
        file = %file_name,
        elements = report.elements_annotated,
        texts = report.texts_wrapped,
        expressions = report.expressions_wrapped,
        kept = report.user_defined_kept,
        "instrumented module"
    );

    Instrumented {
        module,
        names,
        report,
    }
}

struct Instrumenter<'a> {
    locator: &'a Locator<'a>,
    names: &'a GeneratedNames,
    report: InstrumentReport,
}

fn is_wrappable(child: &JsxChild) -> bool {
    match child {
        JsxChild::Text(text) => text.is_significant(),
        JsxChild::Expr(container) => container.expr.is_some(),
        JsxChild::Element(_) => false,
    }
}

impl Instrumenter<'_> {
    fn wrap_children(&mut self, element: &mut JsxElement, wrappable: &[usize]) {
        let Some(children) = element.children.as_mut() else {
            return;
        };
        let last = wrappable.last().copied();

        for &i in wrappable {
            let is_last = Some(i) == last;
            let child = &mut children[i];
            let wrapped = match child {
                JsxChild::Text(text) => {
                    self.report.texts_wrapped += 1;
                    let location = self.locator.location(&text.trimmed_range());
                    JsxExprContainer {
                        expr: Some(record_expression_call(
                            self.names,
                            location,
                            Expr::Str(text.cooked()),
                            false,
                            is_last,
                        )),
                        range: text.range.clone(),
                    }
                }
                JsxChild::Expr(container) => {
                    let Some(expr) = container.expr.take() else {
                        continue;
                    };
                    self.report.expressions_wrapped += 1;
                    let location = self.locator.location(&container.range);
                    JsxExprContainer {
                        expr: Some(record_expression_call(
                            self.names, location, expr, true, is_last,
                        )),
                        range: container.range.clone(),
                    }
                }
                JsxChild::Element(_) => continue,
            };
            *child = JsxChild::Expr(wrapped);
        }
    }
}

impl VisitMut for Instrumenter<'_> {
    fn visit_mut_jsx_element(&mut self, element: &mut JsxElement) {
        let user_self = element.has_attribute(SELF_ATTRIBUTE);
        let user_source = element.has_attribute(SOURCE_ATTRIBUTE);
        let wrappable: Vec<usize> = element
            .children()
            .iter()
            .enumerate()
            .filter(|(_, child)| is_wrappable(child))
            .map(|(i, _)| i)
            .collect();
        let records_children = !user_source && !wrappable.is_empty();

        walk_jsx_element(self, element);

        if user_self {
            self.report.user_defined_kept += 1;
        } else {
            element.attributes.push(self_attribute());
        }

        if user_source {
            trace!(element = %element.name, "keeping user-defined source attribute");
            self.report.user_defined_kept += 1;
        } else {
            let location = self.locator.location(&element.range);
            element
                .attributes
                .push(source_attribute(location, self.names, records_children));
            self.report.elements_annotated += 1;
        }

        if records_children {
            self.wrap_children(element, &wrappable);
        }
    }
}
