use crate::core::value::{ObjectHandle, Value};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Compiled constructor argument.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Value,
}

/// Constructor registered by the host: receives compiled arguments and
/// returns the instance payload.
pub type Constructor = Rc<dyn Fn(&[Argument]) -> Result<Rc<dyn Any>, String>>;

/// Bridge from `new Foo(...)` in a constant expression to live objects.
pub trait ObjectFactory {
    /// Whether the class can be instantiated in this process, as opposed to
    /// merely being known to reflection.
    fn is_loadable(&self, class: &str) -> bool;

    fn instantiate(&self, class: &str, args: &[Argument]) -> Result<ObjectHandle, String>;
}

/// Factory for a process without loadable classes. Every `new` fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObjects;

impl ObjectFactory for NoObjects {
    fn is_loadable(&self, _class: &str) -> bool {
        false
    }

    fn instantiate(&self, class: &str, _args: &[Argument]) -> Result<ObjectHandle, String> {
        Err(format!("Class \"{class}\" not found"))
    }
}

/// Host classes by case-insensitive name.
#[derive(Default)]
pub struct ObjectRegistry {
    constructors: RefCell<HashMap<String, (String, Constructor)>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, class: &str, constructor: Constructor) {
        let class = class.strip_prefix('\\').unwrap_or(class);
        tracing::debug!(class, "registered host class");
        self.constructors
            .borrow_mut()
            .insert(class.to_ascii_lowercase(), (class.to_string(), constructor));
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let classes: Vec<String> = self
            .constructors
            .borrow()
            .values()
            .map(|(name, _)| name.clone())
            .collect();
        f.debug_struct("ObjectRegistry").field("classes", &classes).finish()
    }
}

impl ObjectFactory for ObjectRegistry {
    fn is_loadable(&self, class: &str) -> bool {
        let class = class.strip_prefix('\\').unwrap_or(class);
        self.constructors
            .borrow()
            .contains_key(&class.to_ascii_lowercase())
    }

    fn instantiate(&self, class: &str, args: &[Argument]) -> Result<ObjectHandle, String> {
        let class = class.strip_prefix('\\').unwrap_or(class);
        let entry = self
            .constructors
            .borrow()
            .get(&class.to_ascii_lowercase())
            .cloned();
        let Some((declared, constructor)) = entry else {
            return Err(format!("Class \"{class}\" not found"));
        };
        let payload = constructor(args)?;
        Ok(ObjectHandle::Host {
            class: declared,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_instantiates_case_insensitively() {
        let registry = ObjectRegistry::new();
        registry.register(
            "App\\Money",
            Rc::new(|args: &[Argument]| -> Result<Rc<dyn Any>, String> {
                Ok(Rc::new(args.len()))
            }),
        );
        assert!(registry.is_loadable("\\app\\money"));
        let handle = registry
            .instantiate(
                "APP\\Money",
                &[Argument {
                    name: None,
                    value: Value::Int(5),
                }],
            )
            .unwrap();
        let ObjectHandle::Host { class, payload } = handle else {
            panic!("expected host object");
        };
        assert_eq!(class, "App\\Money");
        assert_eq!(payload.downcast_ref::<usize>(), Some(&1));
        assert!(!NoObjects.is_loadable("App\\Money"));
    }
}
