//! End-to-end parser tests: the canonical scenarios, boundary behaviors,
//! and error recovery.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use toitc_lex::{Scanner, SymbolCanonicalizer, Token};
    use toitc_util::diagnostic::{Diagnostic, Handler, Severity};
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::SourceManager;

    use crate::ast::*;
    use crate::printer::AstPrinter;
    use crate::Parser;

    fn parse(text: &str) -> (Unit, Vec<Diagnostic>) {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///test.toit", text.as_bytes().to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let scanner = Scanner::new(&source, &symbols, &handler);
        let mut parser = Parser::new(&source, scanner, &handler);
        let unit = parser.parse_unit();
        (unit, handler.diagnostics())
    }

    fn error_count(diagnostics: &[Diagnostic]) -> usize {
        diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    fn method<'u>(unit: &'u Unit, index: usize) -> &'u Method {
        match &unit.declarations[index] {
            Declaration::Method(method) => method,
            _ => panic!("expected a method declaration"),
        }
    }

    // ------------------------------------------------------------------
    // Seed scenarios
    // ------------------------------------------------------------------

    #[test]
    fn test_simple_class() {
        let (unit, diagnostics) = parse("class A:\n  foo x/int -> int: return x + 1\n");
        assert_eq!(error_count(&diagnostics), 0);
        assert_eq!(unit.declarations.len(), 1);
        let Declaration::Class(class) = &unit.declarations[0] else {
            panic!("expected a class");
        };
        assert_eq!(class.name.data.as_str(), "A");
        assert!(!class.is_abstract && !class.is_monitor && !class.is_interface);
        assert_eq!(class.members.len(), 1);
        let Declaration::Method(foo) = &class.members[0] else {
            panic!("expected a method member");
        };
        assert_eq!(foo.name.as_identifier().unwrap().data.as_str(), "foo");
        assert_eq!(foo.parameters.len(), 1);
        let parameter = &foo.parameters[0];
        assert_eq!(parameter.name.data.as_str(), "x");
        let type_name = parameter.type_annotation.as_ref().unwrap();
        assert_eq!(type_name.as_identifier().unwrap().data.as_str(), "int");
        let return_type = foo.return_type.as_ref().unwrap();
        assert_eq!(return_type.as_identifier().unwrap().data.as_str(), "int");
        // The body is `return (x + 1)`.
        let body = foo.body.as_ref().unwrap();
        assert_eq!(body.expressions.len(), 1);
        let Expression::Return(ret) = &body.expressions[0] else {
            panic!("expected a return");
        };
        let Expression::Binary(binary) = ret.value.as_ref().unwrap() else {
            panic!("expected a binary expression");
        };
        assert_eq!(binary.kind, Token::Add);
        assert_eq!(binary.left.as_identifier().unwrap().data.as_str(), "x");
    }

    #[test]
    fn test_indentation_driven_block() {
        let (unit, diagnostics) = parse("main:\n  list.do:\n    print it\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let body = main.body.as_ref().unwrap();
        assert_eq!(body.expressions.len(), 1);
        let Expression::Call(call) = &body.expressions[0] else {
            panic!("expected a call");
        };
        let Expression::Dot(dot) = &call.target else {
            panic!("expected a dotted target");
        };
        assert_eq!(dot.name.data.as_str(), "do");
        assert_eq!(call.arguments.len(), 1);
        let Expression::Block(block) = &call.arguments[0] else {
            panic!("expected a block argument");
        };
        assert_eq!(block.body.expressions.len(), 1);
        let Expression::Call(inner) = &block.body.expressions[0] else {
            panic!("expected a call in the block");
        };
        assert_eq!(inner.target.as_identifier().unwrap().data.as_str(), "print");
        assert_eq!(inner.arguments.len(), 1);
        assert_eq!(inner.arguments[0].as_identifier().unwrap().data.as_str(), "it");
    }

    #[test]
    fn test_ternary_vs_block_ambiguity() {
        // `x := true ? foo: bar` - the `?` binds first; the `:` belongs to
        // the conditional, not a block on `foo`.
        let (unit, diagnostics) = parse("x := true ? foo: bar\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Field(field) = &unit.declarations[0] else {
            panic!("expected a global");
        };
        let Expression::If(conditional) = field.initializer.as_ref().unwrap() else {
            panic!("expected a conditional initializer");
        };
        assert!(matches!(conditional.expression, Expression::LiteralBoolean(_)));
        assert_eq!(conditional.yes.as_identifier().unwrap().data.as_str(), "foo");
        let no = conditional.no.as_ref().unwrap();
        assert_eq!(no.as_identifier().unwrap().data.as_str(), "bar");
    }

    #[test]
    fn test_string_interpolation_with_postfix() {
        let (unit, diagnostics) = parse("main:\n  print \"x=$obj.field\"\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Call(call) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!("expected a call");
        };
        let Expression::LiteralStringInterpolation(interpolation) = &call.arguments[0] else {
            panic!("expected an interpolated string");
        };
        assert_eq!(interpolation.parts.len(), 2);
        assert_eq!(interpolation.parts[0].data.as_str(), "x=");
        assert_eq!(interpolation.parts[1].data.as_str(), "");
        assert_eq!(interpolation.expressions.len(), 1);
        let Expression::Dot(dot) = &interpolation.expressions[0] else {
            panic!("expected a dotted interpolation");
        };
        assert_eq!(dot.receiver.as_identifier().unwrap().data.as_str(), "obj");
        assert_eq!(dot.name.data.as_str(), "field");
        assert_eq!(interpolation.formats.len(), 1);
        assert!(interpolation.formats[0].is_none());
    }

    #[test]
    fn test_toitdoc_attachment() {
        let (unit, diagnostics) = parse("/** Adds two. */\nadd a b:\n  return a + b\n");
        assert_eq!(error_count(&diagnostics), 0);
        let add = method(&unit, 0);
        let toitdoc = add.toitdoc.as_ref().expect("toitdoc must attach to `add`");
        assert_eq!(toitdoc.contents.sections.len(), 1);
        let section = &toitdoc.contents.sections[0];
        assert!(section.title.is_none());
        assert_eq!(section.statements.len(), 1);
        let crate::toitdoc::Statement::Paragraph(paragraph) = &section.statements[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(paragraph.expressions.len(), 1);
        let crate::toitdoc::DocExpression::Text(text) = &paragraph.expressions[0] else {
            panic!("expected plain text");
        };
        assert_eq!(text.text.as_str(), "Adds two.");
    }

    #[test]
    fn test_recovery_class_without_colon() {
        // The class signature is malformed, but parsing must recover and
        // still produce class `A`.
        let (unit, diagnostics) = parse("class A\n  foo: 1\n");
        assert!(error_count(&diagnostics) > 0);
        assert_eq!(unit.declarations.len(), 1);
        let Declaration::Class(class) = &unit.declarations[0] else {
            panic!("expected a class despite the missing colon");
        };
        assert_eq!(class.name.data.as_str(), "A");
    }

    // ------------------------------------------------------------------
    // Boundary behaviors
    // ------------------------------------------------------------------

    #[test]
    fn test_empty_file() {
        let (unit, diagnostics) = parse("");
        assert!(diagnostics.is_empty());
        assert!(unit.imports.is_empty());
        assert!(unit.declarations.is_empty());
        assert!(unit.toitdoc.is_none());
    }

    #[test]
    fn test_comment_only_file_gets_module_toitdoc() {
        let (unit, diagnostics) = parse("/** The module doc. */\n");
        assert_eq!(error_count(&diagnostics), 0);
        assert!(unit.declarations.is_empty());
        let toitdoc = unit.toitdoc.as_ref().expect("module toitdoc");
        assert_eq!(toitdoc.contents.sections.len(), 1);
    }

    #[test]
    fn test_module_toitdoc_with_declarations() {
        let (unit, _) = parse("/** Module. */\n\nimport foo\n\n/** Doc of main. */\nmain:\n  1\n");
        assert!(unit.toitdoc.is_some());
        let main = method(&unit, 0);
        assert!(main.toitdoc.is_some());
    }

    #[test]
    fn test_unterminated_string_in_declaration() {
        let (unit, diagnostics) = parse("main:\n  x := \"\n");
        assert!(error_count(&diagnostics) >= 1);
        assert!(diagnostics.iter().any(|d| d.message == "Unterminated string"));
        assert_eq!(unit.declarations.len(), 1);
    }

    #[test]
    fn test_else_binds_to_outer_if() {
        let text = "main:\n  if a:\n    if b:\n      one\n  else:\n    two\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::If(outer) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!("expected an if");
        };
        assert_eq!(outer.expression.as_identifier().unwrap().data.as_str(), "a");
        // The else belongs to the outer if, so the outer has a no-branch
        // and the inner does not.
        assert!(outer.no.is_some());
        let Expression::Sequence(yes) = &outer.yes else { panic!("sequence expected") };
        let Expression::If(inner) = &yes.expressions[0] else {
            panic!("expected the nested if");
        };
        assert!(inner.no.is_none());
    }

    #[test]
    fn test_else_if_chain() {
        let text = "main:\n  if a:\n    one\n  else if b:\n    two\n  else:\n    three\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::If(outer) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!("expected an if");
        };
        let Some(Expression::If(chained)) = &outer.no else {
            panic!("expected an else-if chain");
        };
        assert_eq!(chained.expression.as_identifier().unwrap().data.as_str(), "b");
        assert!(chained.no.is_some());
    }

    #[test]
    fn test_empty_set_and_empty_map() {
        let (unit, diagnostics) = parse("a := {}\nb := {:}\nc := {1, 2}\nd := {1: 2}\n");
        assert_eq!(error_count(&diagnostics), 0);
        let initializer = |index: usize| -> &Expression {
            match &unit.declarations[index] {
                Declaration::Field(field) => field.initializer.as_ref().unwrap(),
                _ => panic!("expected a global"),
            }
        };
        assert!(matches!(initializer(0), Expression::LiteralSet(set) if set.elements.is_empty()));
        assert!(matches!(initializer(1), Expression::LiteralMap(map) if map.keys.is_empty()));
        assert!(
            matches!(initializer(2), Expression::LiteralSet(set) if set.elements.len() == 2)
        );
        assert!(matches!(initializer(3), Expression::LiteralMap(map) if map.keys.len() == 1));
    }

    #[test]
    fn test_list_and_byte_array_literals() {
        let (unit, diagnostics) = parse("a := [1, 2, 3]\nb := #[1, 2, 'x', foo]\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Field(a) = &unit.declarations[0] else { panic!() };
        assert!(matches!(
            a.initializer.as_ref().unwrap(),
            Expression::LiteralList(list) if list.elements.len() == 3
        ));
        let Declaration::Field(b) = &unit.declarations[1] else { panic!() };
        let Expression::LiteralByteArray(bytes) = b.initializer.as_ref().unwrap() else {
            panic!("expected a byte array");
        };
        assert_eq!(bytes.elements.len(), 4);
        assert!(matches!(bytes.elements[2], Expression::LiteralCharacter(_)));
    }

    #[test]
    fn test_imports_and_exports() {
        let text = "import core\nimport .relative.mod as m\nimport lists show map filter\n\
                    export *\nmain:\n  1\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        assert_eq!(unit.imports.len(), 3);
        assert!(!unit.imports[0].is_relative);
        assert!(unit.imports[1].is_relative);
        assert_eq!(unit.imports[1].dot_outs, 0);
        assert_eq!(unit.imports[1].segments.len(), 2);
        assert_eq!(unit.imports[1].prefix.as_ref().unwrap().data.as_str(), "m");
        assert_eq!(unit.imports[2].show_identifiers.len(), 2);
        assert_eq!(unit.exports.len(), 1);
        assert!(unit.exports[0].export_all);
    }

    #[test]
    fn test_dot_out_imports() {
        let (unit, diagnostics) = parse("import ...foo.bar\n");
        assert_eq!(error_count(&diagnostics), 0);
        let import = &unit.imports[0];
        assert!(import.is_relative);
        assert_eq!(import.dot_outs, 2);
        assert_eq!(import.segments.len(), 2);
    }

    #[test]
    fn test_import_after_declaration_is_grouped_error() {
        let (unit, diagnostics) = parse("main:\n  1\nimport core\n");
        assert_eq!(error_count(&diagnostics), 1);
        assert!(diagnostics.iter().any(|d| d.message == "Imports must be before declarations"));
        assert!(diagnostics.iter().any(|d| d.severity == Severity::Note));
        assert_eq!(unit.imports.len(), 1);
    }

    #[test]
    fn test_monitor_and_interface() {
        let text = "monitor M:\n  foo:\n    1\ninterface I:\n  bar\nabstract class C:\n  abstract gee\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(monitor) = &unit.declarations[0] else { panic!() };
        assert!(monitor.is_monitor);
        let Declaration::Class(interface) = &unit.declarations[1] else { panic!() };
        assert!(interface.is_interface);
        let Declaration::Method(bar) = &interface.members[0] else { panic!() };
        assert!(bar.body.is_none());
        let Declaration::Class(class) = &unit.declarations[2] else { panic!() };
        assert!(class.is_abstract);
        let Declaration::Method(gee) = &class.members[0] else { panic!() };
        assert!(gee.is_abstract);
    }

    #[test]
    fn test_abstract_monitor_is_an_error() {
        let (unit, diagnostics) = parse("abstract monitor M:\n  foo:\n    1\n");
        assert!(diagnostics.iter().any(|d| d.message == "Monitors can't be abstract"));
        let Declaration::Class(monitor) = &unit.declarations[0] else { panic!() };
        assert!(!monitor.is_abstract);
    }

    #[test]
    fn test_class_with_super_and_interfaces() {
        let (unit, diagnostics) = parse("class A extends B implements I1 I2:\n  foo:\n    1\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        assert!(class.super_class.is_some());
        assert_eq!(class.interfaces.len(), 2);
    }

    #[test]
    fn test_operator_declarations() {
        let text = "class A:\n  operator == other:\n    return true\n  \
                    operator [] i:\n    return i\n  operator []= i v:\n    return v\n  \
                    operator [..] --from --to:\n    return 0\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        let names: Vec<_> = class
            .members
            .iter()
            .map(|m| match m {
                Declaration::Method(method) => {
                    method.name.as_identifier().unwrap().data.as_str()
                }
                _ => panic!("expected methods"),
            })
            .collect();
        assert_eq!(names, vec!["==", "[]", "[]=", "[..]"]);
    }

    #[test]
    fn test_setter_declaration() {
        let (unit, diagnostics) = parse("class A:\n  value= v:\n    1\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        let Declaration::Method(setter) = &class.members[0] else { panic!() };
        assert!(setter.is_setter);
    }

    #[test]
    fn test_named_constructor() {
        let (unit, diagnostics) = parse("class A:\n  constructor.named x:\n    1\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        let Declaration::Method(constructor) = &class.members[0] else { panic!() };
        let Expression::Dot(dot) = &constructor.name else {
            panic!("expected a dotted constructor name");
        };
        assert_eq!(dot.name.data.as_str(), "named");
    }

    #[test]
    fn test_field_storing_parameters() {
        let (unit, diagnostics) = parse("class A:\n  x := 0\n  constructor this.x:\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        let Declaration::Method(constructor) = &class.members[1] else { panic!() };
        assert!(constructor.parameters[0].is_field_storing);
        assert_eq!(constructor.parameters[0].name.data.as_str(), "x");
    }

    #[test]
    fn test_named_arguments() {
        let text = "main:\n  foo --name=1 --flag --no-verbose bar\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Call(call) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!("expected a call");
        };
        assert_eq!(call.arguments.len(), 4);
        let Expression::NamedArgument(named) = &call.arguments[0] else { panic!() };
        assert_eq!(named.name.data.as_str(), "name");
        assert!(named.expression.is_some());
        let Expression::NamedArgument(flag) = &call.arguments[1] else { panic!() };
        assert!(flag.expression.is_none());
        assert!(!flag.inverted);
        let Expression::NamedArgument(inverted) = &call.arguments[2] else { panic!() };
        assert!(inverted.inverted);
        assert_eq!(inverted.name.data.as_str(), "verbose");
        assert!(matches!(&call.arguments[3], Expression::Identifier(_)));
    }

    #[test]
    fn test_lambda_vs_block() {
        let (unit, diagnostics) = parse("main:\n  run:: it\n  each: it\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let body = main.body.as_ref().unwrap();
        let Expression::Call(run) = &body.expressions[0] else { panic!() };
        assert!(matches!(run.arguments[0], Expression::Lambda(_)));
        let Expression::Call(each) = &body.expressions[1] else { panic!() };
        assert!(matches!(each.arguments[0], Expression::Block(_)));
    }

    #[test]
    fn test_block_parameters() {
        let (unit, diagnostics) = parse("main:\n  each: |x y/int|\n    x\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Call(call) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!()
        };
        let Expression::Block(block) = &call.arguments[0] else { panic!() };
        assert_eq!(block.parameters.len(), 2);
        assert_eq!(block.parameters[0].name.data.as_str(), "x");
        assert!(block.parameters[1].type_annotation.is_some());
    }

    #[test]
    fn test_while_and_for() {
        let text = "main:\n  while a:\n    b\n  for i := 0; i < 10; i++:\n    c\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let body = main.body.as_ref().unwrap();
        assert!(matches!(body.expressions[0], Expression::While(_)));
        let Expression::For(for_loop) = &body.expressions[1] else { panic!() };
        assert!(matches!(
            for_loop.initializer.as_ref().unwrap(),
            Expression::DeclarationLocal(_)
        ));
        assert!(for_loop.condition.is_some());
        let Expression::Unary(update) = for_loop.update.as_ref().unwrap() else { panic!() };
        assert_eq!(update.kind, Token::Increment);
        assert!(!update.prefix);
    }

    #[test]
    fn test_try_finally() {
        let (unit, diagnostics) = parse("main:\n  try:\n    a\n  finally:\n    b\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::TryFinally(try_finally) = &main.body.as_ref().unwrap().expressions[0]
        else {
            panic!("expected try/finally");
        };
        assert_eq!(try_finally.body.expressions.len(), 1);
        assert_eq!(try_finally.handler.expressions.len(), 1);
    }

    #[test]
    fn test_spelled_logical_operators() {
        let (unit, diagnostics) = parse("x := a and b or not c\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Field(field) = &unit.declarations[0] else { panic!() };
        // `or` is the outermost operator; `and` binds tighter.
        let Expression::Binary(or) = field.initializer.as_ref().unwrap() else { panic!() };
        assert_eq!(or.kind, Token::LogicalOr);
        let Expression::Binary(and) = &or.left else { panic!() };
        assert_eq!(and.kind, Token::LogicalAnd);
        let Expression::Unary(not) = &or.right else { panic!() };
        assert_eq!(not.kind, Token::Not);
    }

    #[test]
    fn test_slice_expression() {
        let (unit, diagnostics) = parse("main:\n  x := a[1..2]\n  y := a[..2]\n  z := a[1..]\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let body = main.body.as_ref().unwrap();
        let get = |i: usize| match &body.expressions[i] {
            Expression::DeclarationLocal(local) => &local.value,
            _ => panic!("expected a local definition"),
        };
        let Expression::IndexSlice(full) = get(0) else { panic!() };
        assert!(full.from.is_some() && full.to.is_some());
        let Expression::IndexSlice(from_open) = get(1) else { panic!() };
        assert!(from_open.from.is_none() && from_open.to.is_some());
        let Expression::IndexSlice(to_open) = get(2) else { panic!() };
        assert!(to_open.from.is_some() && to_open.to.is_none());
    }

    #[test]
    fn test_negative_literal_folding() {
        let (unit, diagnostics) = parse("x := -1\ny := -1.5\n");
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Field(x) = &unit.declarations[0] else { panic!() };
        let Expression::LiteralInteger(int) = x.initializer.as_ref().unwrap() else { panic!() };
        assert!(int.is_negated());
        let Declaration::Field(y) = &unit.declarations[1] else { panic!() };
        let Expression::LiteralFloat(float) = y.initializer.as_ref().unwrap() else { panic!() };
        assert!(float.is_negated());
    }

    #[test]
    fn test_undefined_initializer() {
        let (unit, diagnostics) = parse("main:\n  x := ?\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::DeclarationLocal(local) = &main.body.as_ref().unwrap().expressions[0]
        else {
            panic!()
        };
        assert!(matches!(local.value, Expression::LiteralUndefined(_)));
    }

    #[test]
    fn test_return_label_is_deprecated() {
        let (_, diagnostics) = parse("main:\n  return.out\n");
        assert!(diagnostics.iter().any(|d| {
            d.severity == Severity::Warning
                && d.message == "'return.label' is deprecated. Use 'continue.label' instead"
        }));
    }

    #[test]
    fn test_break_with_label() {
        let (unit, diagnostics) = parse("main:\n  while true:\n    break.out\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::While(while_loop) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!()
        };
        let Expression::Sequence(body) = &while_loop.body else { panic!() };
        let Expression::BreakContinue(bc) = &body.expressions[0] else { panic!() };
        assert!(bc.is_break);
        assert_eq!(bc.label.as_ref().unwrap().data.as_str(), "out");
    }

    #[test]
    fn test_string_format_interpolation() {
        let (unit, diagnostics) = parse("main:\n  print \"$(%05d x)!\"\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Call(call) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!()
        };
        let Expression::LiteralStringInterpolation(interpolation) = &call.arguments[0] else {
            panic!("expected an interpolation");
        };
        let format = interpolation.formats[0].as_ref().expect("format spec");
        assert_eq!(format.data.as_str(), "05d");
    }

    #[test]
    fn test_interpolation_error_recovery() {
        // The interior expression is broken; the parser must recover and
        // keep going without cascading scanner confusion.
        let (unit, diagnostics) = parse("main:\n  print \"$(+)\"\n  x := 1\n");
        assert!(error_count(&diagnostics) >= 1);
        assert_eq!(unit.declarations.len(), 1);
    }

    #[test]
    fn test_primitive_call() {
        let (unit, diagnostics) = parse("main:\n  #primitive.core.foo\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Call(call) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!()
        };
        assert!(call.is_call_primitive);
    }

    #[test]
    fn test_sequence_indentation_error() {
        // `break` cannot take the next line as an argument, so the second
        // statement surfaces at a different indentation.
        let (_, diagnostics) = parse("main:\n  break\n   break\n");
        assert!(diagnostics
            .iter()
            .any(|d| d.message == "All expressions in a sequence must be indented the same way"));
    }

    #[test]
    fn test_missing_expression_error_node() {
        let (unit, diagnostics) = parse("main:\n  x :=\n");
        assert!(error_count(&diagnostics) >= 1);
        // The AST is still well-formed: the local exists with an error (or
        // recovered) initializer.
        let main = method(&unit, 0);
        assert_eq!(main.body.as_ref().unwrap().expressions.len(), 1);
    }

    #[test]
    fn test_member_indentation_check() {
        let (_, diagnostics) = parse("class A:\n  foo:\n    1\n bar:\n  2\n");
        assert!(diagnostics.iter().any(|d| d.message == "Members must have the same indentation"));
    }

    #[test]
    fn test_declaration_ranges_are_increasing() {
        let (unit, _) = parse("a := 1\nb := 2\nclass C:\n  foo:\n    3\nmain:\n  4\n");
        let froms: Vec<_> =
            unit.declarations.iter().map(|d| d.range().from().token()).collect();
        let mut sorted = froms.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(froms.len(), sorted.len());
        assert!(froms.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_node_ranges_inside_unit() {
        let text = "main:\n  x := 1 + 2\n  print x\n";
        let (unit, _) = parse(text);
        let main = method(&unit, 0);
        let method_range = main.range;
        for expression in &main.body.as_ref().unwrap().expressions {
            assert!(!expression.range().is_before(method_range));
        }
    }

    fn parse_with_depth(text: &str, max_depth: usize) -> (Unit, Vec<Diagnostic>) {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///deep.toit", text.as_bytes().to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let scanner = Scanner::new(&source, &symbols, &handler);
        let mut parser = Parser::with_max_recursion_depth(&source, scanner, &handler, max_depth);
        let unit = parser.parse_unit();
        (unit, handler.diagnostics())
    }

    #[test]
    fn test_indentation_stack_depth_guard() {
        // Deeply nested parentheses must hit the stack bound without
        // crashing; the scanner jumps to EOF and parsing winds down.
        let mut text = String::from("x := ");
        for _ in 0..200 {
            text.push('(');
        }
        text.push('1');
        for _ in 0..200 {
            text.push(')');
        }
        text.push('\n');
        let (_, diagnostics) = parse_with_depth(&text, 50);
        assert!(diagnostics
            .iter()
            .any(|d| d.message.starts_with("Maximal recursion depth exceeded")));
    }

    #[test]
    fn test_tree_height_guard_clears_declarations() {
        // A long left-folded operator chain builds a tree taller than the
        // bound without deepening the indentation stack.
        let mut text = String::from("x := 1");
        for _ in 0..200 {
            text.push_str(" + 1");
        }
        text.push('\n');
        let (unit, diagnostics) = parse_with_depth(&text, 50);
        assert!(diagnostics
            .iter()
            .any(|d| d.message.starts_with("Maximal recursion depth exceeded")));
        // The declarations were discarded to avoid follow-up overflows.
        assert!(unit.declarations.is_empty());
    }

    #[test]
    fn test_printer_round_trip() {
        let text = "class A:\n  foo x/int -> int:\n    return x + 1\nmain:\n  a := A\n  a.foo 2\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let printed = AstPrinter::new().print_unit(&unit);
        let (reparsed, reparse_diagnostics) = parse(&printed);
        assert_eq!(error_count(&reparse_diagnostics), 0, "printed output: {:?}", printed);
        assert_eq!(reparsed.declarations.len(), unit.declarations.len());
        let Declaration::Class(class) = &reparsed.declarations[0] else { panic!() };
        assert_eq!(class.members.len(), 1);
    }

    #[test]
    fn test_toitdoc_run_merging() {
        let text = "/// First line.\n/// Second line.\nmain:\n  1\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        // Both `///` comments merge into one toitdoc block. A continuation
        // line at the same indentation starts a new paragraph.
        let toitdoc = main.toitdoc.as_ref().expect("merged toitdoc run");
        let statements = &toitdoc.contents.sections[0].statements;
        assert_eq!(statements.len(), 2);
        let texts: Vec<_> = statements
            .iter()
            .map(|statement| match statement {
                crate::toitdoc::Statement::Paragraph(paragraph) => paragraph.to_warning_string(),
                _ => panic!("expected paragraphs"),
            })
            .collect();
        assert_eq!(texts, vec!["First line.", "Second line."]);
    }

    #[test]
    fn test_toitdoc_with_static_modifier_line() {
        // The attacher tolerates one modifier line without a ':' between
        // the toitdoc and the declaration range.
        let text = "class A:\n  /** Doc. */\n  static foo:\n    1\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let Declaration::Class(class) = &unit.declarations[0] else { panic!() };
        let Declaration::Method(foo) = &class.members[0] else { panic!() };
        assert!(foo.is_static);
        assert!(foo.toitdoc.is_some());
    }

    #[test]
    fn test_toitdoc_sections_and_refs() {
        let text = "/**\nIntro text.\n\n# Usage\nCall $add with care.\n\n```\nadd 1 2\n```\n*/\nadd a b:\n  return a + b\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let add = method(&unit, 0);
        let toitdoc = add.toitdoc.as_ref().expect("toitdoc");
        assert_eq!(toitdoc.contents.sections.len(), 2);
        let usage = &toitdoc.contents.sections[1];
        assert_eq!(usage.title.unwrap().as_str(), "Usage");
        assert_eq!(usage.level, 1);
        // The $add reference was parsed through the main parser.
        assert_eq!(toitdoc.refs.len(), 1);
        assert!(!toitdoc.refs[0].is_error());
        assert!(usage.statements.iter().any(|statement| matches!(
            statement,
            crate::toitdoc::Statement::CodeSection(_)
        )));
    }

    #[test]
    fn test_toitdoc_preserves_non_ascii_text() {
        let text = "/// caf\u{e9} — sm\u{f8}rrebr\u{f8}d with `k\u{f8}d`\nfoo:\n  1\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let foo = method(&unit, 0);
        let toitdoc = foo.toitdoc.as_ref().expect("toitdoc");
        let crate::toitdoc::Statement::Paragraph(paragraph) =
            &toitdoc.contents.sections[0].statements[0]
        else {
            panic!("expected a paragraph");
        };
        // Multi-byte UTF-8 sequences pass through extraction untouched.
        assert_eq!(
            paragraph.to_warning_string(),
            "caf\u{e9} \u{2014} sm\u{f8}rrebr\u{f8}d with `k\u{f8}d`"
        );
    }

    #[test]
    fn test_toitdoc_itemized_list() {
        let text = "/**\nSupported:\n- one thing\n- another, with `code`\n*/\nfoo:\n  1\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let foo = method(&unit, 0);
        let toitdoc = foo.toitdoc.as_ref().unwrap();
        let items = toitdoc.contents.sections[0]
            .statements
            .iter()
            .find_map(|statement| match statement {
                crate::toitdoc::Statement::Itemized(itemized) => Some(&itemized.items),
                _ => None,
            })
            .expect("itemized list");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_toitdoc_signature_reference() {
        let text = "/** See $(add a b). */\nadd a b:\n  return a + b\n";
        let (unit, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        let add = method(&unit, 0);
        let toitdoc = add.toitdoc.as_ref().unwrap();
        assert_eq!(toitdoc.refs.len(), 1);
        let reference = &toitdoc.refs[0];
        assert!(reference.is_signature_reference);
        assert_eq!(reference.parameters.len(), 2);
    }

    #[test]
    fn test_toitdoc_errors_are_warnings() {
        // An unterminated code section inside a toitdoc must not fail the
        // compilation.
        let text = "/**\n```\nnever closed\n*/\nfoo:\n  1\n";
        let (_, diagnostics) = parse(text);
        assert_eq!(error_count(&diagnostics), 0);
        assert!(diagnostics.iter().any(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_attacher_requires_adjacency() {
        let text = "/** Lost doc. */\n\n\nfoo:\n  1\n";
        let (unit, _) = parse(text);
        let foo = method(&unit, 0);
        // Two blank lines break the attachment; the comment becomes the
        // module toitdoc instead.
        assert!(foo.toitdoc.is_none());
        assert!(unit.toitdoc.is_some());
    }

    #[test]
    fn test_reattachment_is_idempotent() {
        let text = "/** Module. */\n\n/** Doc. */\nfoo:\n  1\nbar:\n  2\n";
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///re.toit", text.as_bytes().to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let scanner = Scanner::new(&source, &symbols, &handler);
        let mut parser = Parser::new(&source, scanner, &handler);
        let mut unit = parser.parse_unit();

        let attachments: Vec<bool> =
            unit.declarations.iter().map(|d| d.toitdoc().is_some()).collect();
        assert_eq!(attachments, vec![true, false]);
        assert!(unit.toitdoc.is_some());

        // Rerunning the attacher on the already-attached tree yields the
        // same assignments.
        let mut comment_scanner = Scanner::new(&source, &symbols, &handler);
        loop {
            if comment_scanner.next().token() == Token::Eos {
                break;
            }
        }
        crate::toitdoc::attach_toitdoc(
            &mut unit,
            comment_scanner.comments(),
            &source,
            &symbols,
            &handler,
        );
        let reattached: Vec<bool> =
            unit.declarations.iter().map(|d| d.toitdoc().is_some()).collect();
        assert_eq!(reattached, attachments);
        assert!(unit.toitdoc.is_some());
    }

    #[test]
    fn test_deprecated_operator_spellings_still_parse() {
        let (unit, diagnostics) = parse("x := a && b\n");
        assert_eq!(error_count(&diagnostics), 1);
        let Declaration::Field(field) = &unit.declarations[0] else { panic!() };
        let Expression::Binary(binary) = field.initializer.as_ref().unwrap() else { panic!() };
        assert_eq!(binary.kind, Token::LogicalAnd);
    }

    #[test]
    fn test_assignment_rhs_consumes_block() {
        // `foo = bar: it` parses as `foo = (bar: it)`, not `(foo = bar): it`.
        let (unit, diagnostics) = parse("main:\n  foo = bar: it\n");
        assert_eq!(error_count(&diagnostics), 0);
        let main = method(&unit, 0);
        let Expression::Binary(assign) = &main.body.as_ref().unwrap().expressions[0] else {
            panic!("expected the assignment to be outermost");
        };
        assert_eq!(assign.kind, Token::Assign);
        let Expression::Call(call) = &assign.right else {
            panic!("expected the right-hand side to be a call");
        };
        assert!(matches!(call.arguments[0], Expression::Block(_)));
    }
}
