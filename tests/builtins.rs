#[cfg(test)]
mod builtins_tests {
    use std::rc::Rc;

    use tern::builtins::Builtins;
    use tern::error::{ErrorKind, TernError};
    use tern::interpreter::Interpreter;
    use tern::native::{Arity, NativeFunction};
    use tern::value::Value;

    fn run(source: &str) -> Value {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval_source(source, "<test>")
            .unwrap_or_else(|e| panic!("program failed: {}", e))
    }

    fn uncaught_class(source: &str) -> String {
        let mut interpreter = Interpreter::new();
        match interpreter.eval_source(source, "<test>") {
            Err(TernError::Uncaught { class, .. }) => class,
            other => panic!("expected an uncaught exception, got {:?}", other),
        }
    }

    fn strs(items: &[&str]) -> Value {
        Value::list(items.iter().map(|s| Value::str(*s)).collect())
    }

    fn nums(items: &[f64]) -> Value {
        Value::list(items.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn test_global_functions() {
        assert_eq!(run("str(12)"), Value::str("12"));
        assert_eq!(run("range(3)"), nums(&[0.0, 1.0, 2.0]));
        assert_eq!(run("range(2, 5)"), nums(&[2.0, 3.0, 4.0]));
        assert_eq!(run("clock() > 0"), Value::Bool(true));
        assert_eq!(run("print(\"hello\", 1)"), Value::Null);
        assert_eq!(uncaught_class("range(1.5)"), "TypeMismatch");
    }

    #[test]
    fn test_type_of_values() {
        assert_eq!(run("type(1) == Number"), Value::Bool(true));
        assert_eq!(run("type(\"s\") == String"), Value::Bool(true));
        assert_eq!(run("type(null).name"), Value::str("Null"));
        assert_eq!(run("type((1, 2)).name"), Value::str("Tuple"));
        assert_eq!(run("type(print).name"), Value::str("Function"));
        assert_eq!(run("type(List).name"), Value::str("Class"));
    }

    #[test]
    fn test_assert() {
        assert_eq!(run("assert(1 == 1)"), Value::Null);

        let mut interpreter = Interpreter::new();
        match interpreter.eval_source("assert(1 == 2, \"math is broken\")", "<test>") {
            Err(TernError::Uncaught { class, message, .. }) => {
                assert_eq!(class, "InvalidOperation");
                assert_eq!(message, "math is broken");
            }
            other => panic!("expected an assertion failure, got {:?}", other),
        }
    }

    #[test]
    fn test_native_overload_by_arity() {
        assert_eq!(uncaught_class("assert()"), "ArityMismatch");
        assert_eq!(uncaught_class("\"abc\".upper(1)"), "ArityMismatch");
    }

    #[test]
    fn test_string_class() {
        assert_eq!(run("\"abc\".size"), Value::Number(3.0));
        assert_eq!(run("\"abc\".upper()"), Value::str("ABC"));
        assert_eq!(run("\"ABC\".lower()"), Value::str("abc"));
        assert_eq!(run("\"  x \".trim()"), Value::str("x"));
        assert_eq!(run("\"a,b\".split(\",\")"), strs(&["a", "b"]));
        assert_eq!(run("\"ab\".split(\"\")"), strs(&["a", "b"]));
        assert_eq!(run("\"team\".contains(\"ea\")"), Value::Bool(true));
        assert_eq!(run("\"hi\".chars()"), strs(&["h", "i"]));
        assert_eq!(run("String(12)"), Value::str("12"));
    }

    #[test]
    fn test_native_functions_bind_their_receiver() {
        assert_eq!(run("up = \"abc\".upper; up()"), Value::str("ABC"));
        assert_eq!(run("xs = [1]; push = xs.push; push(2); xs.size"), Value::Number(2.0));
    }

    #[test]
    fn test_number_class() {
        assert_eq!(run("3.7.floor()"), Value::Number(3.0));
        assert_eq!(run("3.2.ceil()"), Value::Number(4.0));
        assert_eq!(run("2.5.round()"), Value::Number(3.0));
        assert_eq!(run("(-4).abs()"), Value::Number(4.0));
        assert_eq!(run("Number(\" 42 \")"), Value::Number(42.0));
        assert_eq!(uncaught_class("Number(\"x\")"), "TypeMismatch");
    }

    #[test]
    fn test_list_class() {
        assert_eq!(run("xs = []; xs.push(1).push(2); xs"), nums(&[1.0, 2.0]));
        assert_eq!(run("xs = [1, 2]; xs.pop() + xs.size"), Value::Number(3.0));
        assert_eq!(uncaught_class("[].pop()"), "OutOfBounds");
        assert_eq!(run("[1, 2].contains(2)"), Value::Bool(true));
        assert_eq!(run("[1, 2, 3].map(x -> x * 2)"), nums(&[2.0, 4.0, 6.0]));
        assert_eq!(run("[1, 2, 3, 4].filter(x -> x % 2 == 0)"), nums(&[2.0, 4.0]));
        assert_eq!(run("[1, 2, 3].fold(0, (acc, x) -> acc + x)"), Value::Number(6.0));
        assert_eq!(run("[1, 2, 3].join(\", \")"), Value::str("1, 2, 3"));
        assert_eq!(run("[\"a\", \"b\"].join()"), Value::str("ab"));
        assert_eq!(run("xs = [1, 2]; ys = xs.reverse(); (xs[0], ys[0])"), {
            Value::tuple(vec![Value::Number(1.0), Value::Number(2.0)])
        });
        assert_eq!(run("total = 0; [1, 2].each(x -> total += x); total"), Value::Number(3.0));
        assert_eq!(run("List(1, 2)"), nums(&[1.0, 2.0]));
        assert_eq!(run("[1] + [2]"), nums(&[1.0, 2.0]));
    }

    #[test]
    fn test_map_class() {
        assert_eq!(run("m = [\"b\": 1, \"a\": 2]; m.keys()"), strs(&["b", "a"]));
        assert_eq!(run("m = [\"b\": 1, \"a\": 2]; m.values()"), nums(&[1.0, 2.0]));
        assert_eq!(run("[\"a\": 1].has(\"a\")"), Value::Bool(true));
        assert_eq!(run("[:].get(\"x\")"), Value::Null);
        assert_eq!(run("[:].get(\"x\", 0)"), Value::Number(0.0));
        assert_eq!(
            run("m = [\"a\": 1, \"b\": 2]; m.remove(\"a\"); (m.size, m.keys())"),
            Value::tuple(vec![Value::Number(1.0), strs(&["b"])])
        );
        assert_eq!(run("m = Map(); m[(1, 2)] = \"t\"; m[(1, 2)]"), Value::str("t"));
    }

    #[test]
    fn test_tuple_class() {
        assert_eq!(run("(1, 2, 3).size"), Value::Number(3.0));
        assert_eq!(run("(1, 2).toList()"), nums(&[1.0, 2.0]));
        assert_eq!(run("Tuple(1)"), Value::tuple(vec![Value::Number(1.0)]));
    }

    #[test]
    fn test_function_and_class_introspection() {
        assert_eq!(run("f(a, b) = a; f.name"), Value::str("f"));
        assert_eq!(run("f(a, b) = a; f.arity"), Value::Number(2.0));
        assert_eq!(run("print.arity"), Value::Null);
        assert_eq!(run("class A {}; class B : A {}; B.superclass.name"), Value::str("A"));
        assert_eq!(run("class A {}; A.superclass"), Value::Null);
    }

    #[test]
    fn test_synthetic_classes_without_constructor() {
        assert_eq!(uncaught_class("Bool()"), "InvalidOperation");
        assert_eq!(uncaught_class("Null()"), "InvalidOperation");
    }

    #[test]
    fn test_builtin_member_lookup_failure() {
        assert_eq!(uncaught_class("\"abc\".nope"), "UndefinedReference");
        assert_eq!(uncaught_class("\"abc\".size = 4"), "InvalidOperation");
    }

    #[test]
    fn test_error_classes_extend_exception() {
        let builtins = Builtins::new();

        for kind in ErrorKind::ALL {
            let class = builtins.error_class(kind);
            assert_eq!(class.name, kind.class_name());
            assert!(class.is_subclass_of(&builtins.exception));
        }
    }

    #[test]
    fn test_class_of_values() {
        let builtins = Builtins::new();

        assert!(Rc::ptr_eq(&builtins.class_of(&Value::Null), &builtins.null));
        assert!(Rc::ptr_eq(&builtins.class_of(&Value::str("x")), &builtins.string));
        assert!(builtins.is_instance(&Value::list(vec![]), &builtins.list));
        assert!(!builtins.is_instance(&Value::Number(1.0), &builtins.string));
    }

    #[test]
    fn test_native_overload_selection() {
        fn first(_: &mut Interpreter, _: &[Value]) -> tern::interpreter::IResult<Value> {
            Ok(Value::str("exact"))
        }
        fn rest(_: &mut Interpreter, _: &[Value]) -> tern::interpreter::IResult<Value> {
            Ok(Value::str("variadic"))
        }

        let function = NativeFunction::new("pick")
            .overload(Arity::AtLeast(0), rest)
            .overload(Arity::Exact(1), first);

        assert!(function.select(1).is_some());
        assert!(function.select(3).is_some());
        assert_eq!(function.arities(), "0+ or 1");

        let mut interpreter = Interpreter::new();
        let picked = function
            .invoke(&mut interpreter, None, vec![Value::Null])
            .expect("overload should run");
        assert_eq!(picked, Value::str("exact"));

        let picked = function
            .invoke(&mut interpreter, None, vec![])
            .expect("overload should run");
        assert_eq!(picked, Value::str("variadic"));

        let strict = NativeFunction::new("strict").overload(Arity::Exact(2), first);
        let err = strict
            .invoke(&mut interpreter, None, vec![])
            .expect_err("arity should be checked");
        assert_eq!(err.kind(), Some(ErrorKind::ArityMismatch));
    }
}
