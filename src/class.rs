use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::function::LoxFunction;
use crate::value::Value;

/// A class object. Also the receiver of static class-method reads
/// (`ClassName.m`), where `this` binds to the class itself.
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    properties: HashMap<String, Rc<LoxFunction>>,
    methods: HashMap<String, Rc<LoxFunction>>,
    class_methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        properties: HashMap<String, Rc<LoxFunction>>,
        methods: HashMap<String, Rc<LoxFunction>>,
        class_methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            properties,
            methods,
            class_methods,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    pub fn find_property(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(property) = self.properties.get(name) {
            return Some(property.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_property(name))
    }

    pub fn find_class_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(class_method) = self.class_methods.get(name) {
            return Some(class_method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_class_method(name))
    }

    /// The constructor body: a method named `init`, or one bearing the
    /// class's own name.
    pub fn initializer(&self) -> Option<Rc<LoxFunction>> {
        self.find_method("init")
            .or_else(|| self.find_method(&self.name))
    }

    pub fn arity(&self) -> usize {
        self.initializer()
            .map_or(0, |initializer| initializer.arity())
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass").field("name", &self.name).finish()
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An instance: a class handle plus a mutable field map. Only instances
/// have assignable fields.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fields may hold the instance itself; stay shallow.
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .finish()
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
