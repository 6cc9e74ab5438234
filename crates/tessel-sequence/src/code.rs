//! Source rendering for sequences.

use crate::sequence::{variable_name, Sequence};

/// Code fragments contributed around individual statements, e.g. the
/// `try { ... } catch` wrapper of an expected-exception check.
pub trait StatementDecorator {
    fn pre_statement(&self, _index: usize) -> Vec<String> {
        Vec::new()
    }

    fn post_statement(&self, _index: usize) -> Vec<String> {
        Vec::new()
    }
}

/// Plain rendering with no fragments.
pub struct NoDecoration;

impl StatementDecorator for NoDecoration {}

impl Sequence {
    pub fn to_code_string(&self) -> String {
        self.to_code_with(&NoDecoration)
    }

    /// One line per statement, each surrounded by the decorator's pre- and
    /// post-statement fragments.
    pub fn to_code_with(&self, decorator: &dyn StatementDecorator) -> String {
        let mut out = String::new();
        for (i, stmt) in self.statements().enumerate() {
            for line in decorator.pre_statement(i) {
                out.push_str(&line);
                out.push('\n');
            }
            let inputs: Vec<String> = self
                .input_indices(i)
                .into_iter()
                .map(variable_name)
                .collect();
            stmt.operation()
                .append_code(&variable_name(i), &inputs, &mut out);
            out.push('\n');
            for line in decorator.post_statement(i) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::{LiteralValue, Operation, PrimitiveKind, TypeRegistry};

    struct Tagged;

    impl StatementDecorator for Tagged {
        fn post_statement(&self, index: usize) -> Vec<String> {
            if index == 1 {
                vec!["assertNotNull(var1);".to_string()]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_code_with_fragments() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let int = reg.primitive(PrimitiveKind::Int);
        let seq = Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(2)).unwrap()))
            .unwrap()
            .extend_indices(Arc::new(Operation::constructor(&foo, vec![int])), &[0])
            .unwrap();

        assert_eq!(
            seq.to_code_string(),
            "int var0 = 2;\npkg.Foo var1 = new pkg.Foo(var0);\n"
        );
        assert_eq!(
            seq.to_code_with(&Tagged),
            "int var0 = 2;\npkg.Foo var1 = new pkg.Foo(var0);\nassertNotNull(var1);\n"
        );
    }
}
