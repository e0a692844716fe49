#[cfg(test)]
mod imports_tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;
    use tern::error::TernError;
    use tern::interpreter::Interpreter;
    use tern::module;
    use tern::value::Value;

    fn write(dir: &Path, relative: &str, source: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create module directory");
        }
        fs::write(path, source).expect("write module");
    }

    fn run_in(dir: &Path, source: &str) -> Value {
        let mut interpreter = Interpreter::with_module_root(dir);
        interpreter
            .eval_source(source, "<test>")
            .unwrap_or_else(|e| panic!("program failed: {}", e))
    }

    #[test]
    fn test_relative_path() {
        let segments = vec!["geo".to_string(), "shapes".to_string()];
        assert_eq!(module::relative_path(&segments), "geo/shapes.tern");
    }

    #[test]
    fn test_import_from_module_root() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "util.tern", "double(x) = x * 2\n");

        assert_eq!(run_in(dir.path(), "import util\ndouble(4)"), Value::Number(8.0));
    }

    #[test]
    fn test_nested_module_path() {
        let dir = TempDir::new().expect("temp dir");
        write(
            dir.path(),
            "geo/shapes.tern",
            "class Square {\n  side = 1\n  area() = self.side * self.side\n}\n",
        );

        let source = "import geo.shapes\ns = Square()\ns.side = 3\ns.area()";
        assert_eq!(run_in(dir.path(), source), Value::Number(9.0));
    }

    #[test]
    fn test_module_is_imported_once() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "counter.tern", "loaded = loaded + 1\n");

        let source = "loaded = 0\nimport counter\nimport counter\nloaded";
        assert_eq!(run_in(dir.path(), source), Value::Number(1.0));
    }

    #[test]
    fn test_import_binds_into_importing_frame() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "consts.tern", "answer = 42\n");

        let mut interpreter = Interpreter::with_module_root(dir.path());
        let value = interpreter
            .eval_source("{ import consts; answer }", "<test>")
            .expect("import in a block should work");

        assert_eq!(value, Value::Number(42.0));
        assert!(interpreter.lookup("answer").is_none());
    }

    #[test]
    fn test_missing_module() {
        let dir = TempDir::new().expect("temp dir");

        let value = run_in(
            dir.path(),
            "try { import missing.mod } catch { e: UndefinedReference -> e.message }",
        );
        assert_eq!(value, Value::str("module not found: missing/mod.tern"));
    }

    #[test]
    fn test_errors_in_modules_report_module_file() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "broken.tern", "ok = 1\nboom()\n");

        let mut interpreter = Interpreter::with_module_root(dir.path());
        match interpreter.eval_source("import broken", "<test>") {
            Err(TernError::Uncaught { class, trace, .. }) => {
                assert_eq!(class, "UndefinedReference");
                assert_eq!(trace[0].file, "broken.tern");
                assert_eq!(trace[0].line, 2);
            }
            other => panic!("expected an uncaught exception, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_in_module_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "bad.tern", "x = (\n");

        let mut interpreter = Interpreter::with_module_root(dir.path());
        let result = interpreter.eval_source("try { import bad } catch { _ -> 0 }", "<test>");

        assert!(matches!(result, Err(ref e) if e.is_parse_time()));
    }

    #[test]
    fn test_embedded_functional_module() {
        let dir = TempDir::new().expect("temp dir");

        assert_eq!(
            run_in(dir.path(), "import std.functional\nsum([1, 2, 3])"),
            Value::Number(6.0)
        );
        assert_eq!(
            run_in(dir.path(), "import std.functional\ncount([1, 2, 3, 4], x -> x > 2)"),
            Value::Number(2.0)
        );
        assert_eq!(
            run_in(dir.path(), "import std.functional\napply((a, b) -> a - b, 5, 3)"),
            Value::Number(2.0)
        );
        assert_eq!(
            run_in(dir.path(), "import std.functional\nstr(zip([1, 2], [\"a\", \"b\", \"c\"]))"),
            Value::str("[(1, \"a\"), (2, \"b\")]")
        );
        assert_eq!(
            run_in(dir.path(), "import std.functional\nseen = []\ntimes(3, i -> seen.push(i))\nseen.size"),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_embedded_assert_module() {
        let dir = TempDir::new().expect("temp dir");

        assert_eq!(
            run_in(dir.path(), "import std.assert\nassertEqual(1 + 1, 2)"),
            Value::Null
        );
        assert_eq!(
            run_in(
                dir.path(),
                "import std.assert\nassertThrows(() -> 1 / 0, InvalidOperation)"
            ),
            Value::Null
        );

        let mut interpreter = Interpreter::with_module_root(dir.path());
        match interpreter.eval_source("import std.assert\nassertEqual(1, 2)", "<test>") {
            Err(TernError::Uncaught { class, message, .. }) => {
                assert_eq!(class, "InvalidOperation");
                assert_eq!(message, "expected 2 but got 1");
            }
            other => panic!("expected an assertion failure, got {:?}", other),
        }
    }

    #[test]
    fn test_embedded_modules_are_listed() {
        assert!(module::embedded("std/functional.tern").is_some());
        assert!(module::embedded("std/assert.tern").is_some());
        assert!(module::embedded("std/nothing.tern").is_none());
    }

    #[test]
    fn test_run_file_resolves_imports_next_to_script() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "lib/greet.tern", "greet(name) = \"hi \" ~ name\n");
        write(dir.path(), "main.tern", "import lib.greet\ngreet(\"ada\")\n");

        let mut interpreter = Interpreter::new();
        let value = interpreter
            .run_file(&dir.path().join("main.tern"))
            .expect("script should run");

        assert_eq!(value, Value::str("hi ada"));
    }
}
