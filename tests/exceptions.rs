#[cfg(test)]
mod exceptions_tests {
    use tern::error::TernError;
    use tern::interpreter::Interpreter;
    use tern::value::Value;

    fn run(source: &str) -> Value {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval_source(source, "<test>")
            .unwrap_or_else(|e| panic!("program failed: {}", e))
    }

    #[test]
    fn test_thrown_value_keeps_its_identity() {
        let source = "
            class Boom {}
            b = Boom()
            caught = try { throw b } catch { e -> e }
            caught == b
        ";
        assert_eq!(run(source), Value::Bool(true));
    }

    #[test]
    fn test_any_value_can_be_thrown() {
        assert_eq!(run("try { throw 42 } catch { n -> n + 1 }"), Value::Number(43.0));
        assert_eq!(
            run("try { throw (\"code\", 7) } catch { (\"code\", n) -> n }"),
            Value::Number(7.0)
        );
    }

    #[test]
    fn test_try_without_error_yields_body_value() {
        assert_eq!(run("try { 1 + 1 } catch { _ -> 0 }"), Value::Number(2.0));
    }

    #[test]
    fn test_unmatched_exception_is_reraised() {
        let source = "
            try {
                try { throw \"x\" } catch { e: TypeMismatch -> \"inner\" }
            } catch { e -> \"outer \" ~ e }
        ";
        assert_eq!(run(source), Value::str("outer x"));
    }

    #[test]
    fn test_reraised_object_keeps_its_identity() {
        let source = "
            class Failure : Exception {}
            x = Failure(\"m\")
            y = try {
                try { throw x } catch { e: TypeMismatch -> 0 }
            } catch { e -> e }
            (y == x) and (y == Failure(\"m\")) == false
        ";
        assert_eq!(run(source), Value::Bool(true));
    }

    #[test]
    fn test_runtime_errors_become_exception_instances() {
        assert_eq!(
            run("try { missing } catch { e: UndefinedReference -> e.message }"),
            Value::str("undefined variable 'missing'")
        );
        assert_eq!(
            run("try { 1 / 0 } catch { e: Exception -> type(e).name }"),
            Value::str("InvalidOperation")
        );
        assert_eq!(
            run("try { [].pop() } catch { e: OutOfBounds -> e.toString() }"),
            Value::str("pop from an empty list")
        );
    }

    #[test]
    fn test_user_exception_classes() {
        let source = "
            class AppError : Exception {}
            class NotFound : AppError {}
            try { throw NotFound(\"no such user\") } catch {
                e: TypeMismatch -> \"wrong\"
                e: AppError -> type(e).name ~ \": \" ~ e.message
            }
        ";
        assert_eq!(run(source), Value::str("NotFound: no such user"));
    }

    #[test]
    fn test_exception_without_message() {
        assert_eq!(run("Exception().toString()"), Value::str("Exception"));
        assert_eq!(run("Exception().message"), Value::Null);
        assert_eq!(run("Exception(\"m\").toString()"), Value::str("m"));
    }

    #[test]
    fn test_handler_errors_propagate() {
        let source = "
            try {
                try { throw 1 } catch { _ -> missing }
            } catch { e: UndefinedReference -> \"from handler\" }
        ";
        assert_eq!(run(source), Value::str("from handler"));
    }

    #[test]
    fn test_return_passes_through_try() {
        let source = "
            f() = {
                try { return 1 } catch { _ -> 2 }
                3
            }
            f()
        ";
        assert_eq!(run(source), Value::Number(1.0));
    }

    #[test]
    fn test_exception_crosses_function_frames() {
        let source = "
            inner() = throw \"deep\"
            outer() = inner()
            try { outer() } catch { e -> e }
        ";
        assert_eq!(run(source), Value::str("deep"));
    }

    #[test]
    fn test_stacktrace_inside_handler_describes_raise_point() {
        let source = "
            fail() = throw \"oops\"
            try { fail() } catch { _ -> stacktrace() }
        ";
        let trace = run(source);

        let Value::List(entries) = trace else {
            panic!("stacktrace should return a list, got {}", trace);
        };
        let entries = entries.borrow();
        let first = entries[0].as_str().expect("entries are strings");
        let last = entries[entries.len() - 1].as_str().expect("entries are strings");

        assert!(first.starts_with("fail (<test>:"), "got {}", first);
        assert!(last.starts_with("<global> (<test>:"), "got {}", last);
    }

    #[test]
    fn test_stacktrace_outside_handler_is_the_live_stack() {
        let source = "
            where() = stacktrace()[0]
            where()
        ";
        assert_eq!(run(source), Value::str("where (<test>:2)"));
    }

    #[test]
    fn test_nested_handlers_restore_outer_trace() {
        let source = "
            a() = throw \"a\"
            b() = throw \"b\"
            try { a() } catch {
                _ -> {
                    try { b() } catch { _ -> null }
                    stacktrace()[0]
                }
            }
        ";
        let value = run(source);
        let text = value.as_str().expect("trace entry is a string");
        assert!(text.starts_with("a ("), "got {}", text);
    }

    #[test]
    fn test_uncaught_runtime_error() {
        let mut interpreter = Interpreter::new();

        match interpreter.eval_source("\n\nmissing", "<test>") {
            Err(TernError::Uncaught {
                class,
                message,
                trace,
            }) => {
                assert_eq!(class, "UndefinedReference");
                assert_eq!(message, "undefined variable 'missing'");
                assert_eq!(trace.len(), 1);
                assert_eq!(trace[0].function, "<global>");
                assert_eq!(trace[0].file, "<test>");
                assert_eq!(trace[0].line, 3);
            }
            other => panic!("expected an uncaught exception, got {:?}", other),
        }
    }

    #[test]
    fn test_uncaught_thrown_value() {
        let mut interpreter = Interpreter::new();

        match interpreter.eval_source("f() = throw \"bad\"\nf()", "<test>") {
            Err(TernError::Uncaught {
                class,
                message,
                trace,
            }) => {
                assert_eq!(class, "String");
                assert_eq!(message, "bad");
                assert_eq!(trace[0].function, "f");
                assert_eq!(trace.last().map(|t| t.function.as_str()), Some("<global>"));
            }
            other => panic!("expected an uncaught exception, got {:?}", other),
        }
        assert_eq!(interpreter.depth(), 1);
    }

    #[test]
    fn test_uncaught_error_display() {
        let mut interpreter = Interpreter::new();
        let err = interpreter
            .eval_source("throw Exception(\"nope\")", "<test>")
            .expect_err("throw should escape");

        assert_eq!(err.to_string(), "Uncaught Exception: nope");
        assert!(!err.is_parse_time());
    }
}
