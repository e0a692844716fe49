#[cfg(test)]
mod objects_tests {
    use tern::error::TernError;
    use tern::interpreter::Interpreter;
    use tern::value::Value;

    const SHAPES: &str = "
        class Point {
            x = 0
            y = 0
            init(x, y) = {
                self.x = x
                self.y = y
            }
            sum() = self.x + self.y
        }

        class Animal {
            name = \"?\"
            init(n) = { self.name = n }
            speak() = self.name ~ \" makes a sound\"
            kind() = \"animal\"
        }

        class Dog : Animal {
            init(n) = { super.init(n) }
            speak() = super.speak() ~ \"!\"
        }

        class Cat : Animal {}
    ";

    fn run(source: &str) -> Value {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval_source(SHAPES, "<shapes>")
            .expect("class declarations should run");
        interpreter
            .eval_source(source, "<test>")
            .unwrap_or_else(|e| panic!("program failed: {}", e))
    }

    fn uncaught(source: &str) -> (String, String) {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval_source(SHAPES, "<shapes>")
            .expect("class declarations should run");
        match interpreter.eval_source(source, "<test>") {
            Err(TernError::Uncaught { class, message, .. }) => (class, message),
            other => panic!("expected an uncaught exception, got {:?}", other),
        }
    }

    #[test]
    fn test_fields_and_init() {
        assert_eq!(run("p = Point(1, 2); p.sum()"), Value::Number(3.0));
        assert_eq!(run("p = Point(1, 2); p.x = 10; p.sum()"), Value::Number(12.0));
        assert_eq!(run("str(Point(0, 0))"), Value::str("<Point instance>"));
        assert_eq!(run("str(Point)"), Value::str("<class Point>"));
    }

    #[test]
    fn test_super_delegation() {
        assert_eq!(run("Dog(\"rex\").speak()"), Value::str("rex makes a sound!"));
        assert_eq!(run("Dog(\"rex\").kind()"), Value::str("animal"));
        assert_eq!(run("Dog(\"rex\").name"), Value::str("rex"));
    }

    #[test]
    fn test_inherited_init() {
        assert_eq!(run("Cat(\"tom\").speak()"), Value::str("tom makes a sound"));
    }

    #[test]
    fn test_setting_an_inherited_field() {
        assert_eq!(run("d = Dog(\"rex\"); d.name = \"max\"; d.speak()"), {
            Value::str("max makes a sound!")
        });
    }

    #[test]
    fn test_field_defaults_are_fresh_per_instance() {
        let source = "
            class Bag { items = [] }
            a = Bag()
            b = Bag()
            a.items.push(1)
            b.items.size
        ";
        assert_eq!(run(source), Value::Number(0.0));
    }

    #[test]
    fn test_superclass_fields_initialize_first() {
        let source = "
            log = []
            class Base { x = log.push(\"base\") }
            class Derived : Base { y = log.push(\"derived\") }
            d = Derived()
            log.join(\",\") ~ \" \" ~ d.x.size
        ";
        assert_eq!(run(source), Value::str("base,derived 2"));
    }

    #[test]
    fn test_field_defaults_see_self() {
        let source = "
            class Pair {
                left = 1
                right = self.left + 1
            }
            Pair().right
        ";
        assert_eq!(run(source), Value::Number(2.0));
    }

    #[test]
    fn test_methods_bind_their_receiver() {
        assert_eq!(run("p = Point(2, 3); f = p.sum; f()"), Value::Number(5.0));
    }

    #[test]
    fn test_functions_are_not_assignable() {
        assert_eq!(uncaught("p = Point(1, 2); p.sum = 1").0, "InvalidOperation");
    }

    #[test]
    fn test_unknown_member() {
        let (class, message) = uncaught("Point(1, 2).z");
        assert_eq!(class, "UndefinedReference");
        assert!(message.contains("'z'"));

        assert_eq!(uncaught("p = Point(1, 2); p.z = 1").0, "UndefinedReference");
    }

    #[test]
    fn test_native_classes_can_not_be_extended() {
        assert_eq!(uncaught("class Stack : List {}").0, "InvalidOperation");
        assert_eq!(uncaught("x = 1; class Odd : x {}").0, "TypeMismatch");
        assert_eq!(uncaught("class Lost : Nowhere {}").0, "UndefinedReference");
    }

    #[test]
    fn test_constructor_arity() {
        assert_eq!(uncaught("Point(1)").0, "ArityMismatch");
        assert_eq!(uncaught("class Plain {}; Plain(1)").0, "ArityMismatch");
        assert_eq!(run("class Plain {}; str(Plain())"), Value::str("<Plain instance>"));
    }

    #[test]
    fn test_arity_mismatch_runs_no_body() {
        let source = "
            hits = 0
            f(a) = { hits += 1 }
            try { f(1, 2) } catch { _: ArityMismatch -> hits }
        ";
        assert_eq!(run(source), Value::Number(0.0));
    }

    #[test]
    fn test_object_equality_is_identity() {
        assert_eq!(run("p = Point(1, 2); q = p; p == q"), Value::Bool(true));
        assert_eq!(run("Point(1, 2) == Point(1, 2)"), Value::Bool(false));
    }

    #[test]
    fn test_instances_as_map_keys() {
        let source = "
            p = Point(1, 2)
            m = [:]
            m[p] = \"found\"
            m[p]
        ";
        assert_eq!(run(source), Value::str("found"));
    }

    #[test]
    fn test_type_of_instance() {
        assert_eq!(run("type(Dog(\"a\")) == Dog"), Value::Bool(true));
    }

    #[test]
    fn test_constructor_frames_are_popped() {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval_source(SHAPES, "<shapes>")
            .expect("class declarations should run");

        let _ = interpreter.eval_source("Dog(\"a\"); Point(1)", "<test>");
        assert_eq!(interpreter.depth(), 1);
    }
}
