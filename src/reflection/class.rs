use super::class_constant::ReflectionClassConstant;
use super::doc_comment_text;
use super::enum_case::ReflectionEnumCase;
use super::function::ReflectionMethod;
use super::property::ReflectionProperty;
use crate::identifier::IdentifierKind;
use crate::parser::ast::{ClassDecl, ClassKind, ClassMember, Modifiers, Program, Visibility};
use crate::reflector::{ReflectionError, Reflector};
use crate::source_locator::{Declaration, LocatedDeclaration, LocatedSource};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

fn is_implicit_enum_interface(name: &str) -> bool {
    name.eq_ignore_ascii_case("UnitEnum") || name.eq_ignore_ascii_case("BackedEnum")
}

/// Class, interface, trait or enum.
#[derive(Clone)]
pub struct ReflectionClass {
    reflector: Reflector,
    located: LocatedDeclaration,
    decl: Rc<ClassDecl>,
}

impl fmt::Debug for ReflectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionClass")
            .field("name", &self.name())
            .finish()
    }
}

impl ReflectionClass {
    pub fn from_located(
        reflector: Reflector,
        located: LocatedDeclaration,
    ) -> Result<Self, ReflectionError> {
        let Declaration::Class(decl) = &located.declaration else {
            return Err(ReflectionError::IdentifierNotFound {
                kind: IdentifierKind::Class,
                name: located.name(),
            });
        };
        let decl = decl.clone();
        Ok(Self {
            reflector,
            located,
            decl,
        })
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn declaration(&self) -> &Rc<ClassDecl> {
        &self.decl
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        &self.located.source
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.located.program
    }

    pub fn name(&self) -> String {
        self.located.name()
    }

    pub fn short_name(&self) -> String {
        match &self.decl.name {
            Some(name) => name.short.clone(),
            None => self.name(),
        }
    }

    pub fn namespace_name(&self) -> &str {
        &self.decl.namespace
    }

    pub fn in_namespace(&self) -> bool {
        !self.decl.namespace.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.located.source.file_name()
    }

    pub fn start_line(&self) -> usize {
        self.program().line_index.start_line(self.decl.span)
    }

    pub fn end_line(&self) -> usize {
        self.program().line_index.end_line(self.decl.span)
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.decl.doc_comment, self.located.source.source())
    }

    pub fn kind(&self) -> ClassKind {
        self.decl.kind
    }

    pub fn is_interface(&self) -> bool {
        self.decl.kind == ClassKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.decl.kind == ClassKind::Trait
    }

    pub fn is_enum(&self) -> bool {
        self.decl.kind == ClassKind::Enum
    }

    pub fn is_anonymous(&self) -> bool {
        self.decl.name.is_none()
    }

    pub fn is_abstract(&self) -> bool {
        self.decl.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.is_enum() || self.decl.modifiers.contains(Modifiers::FINAL)
    }

    pub fn is_readonly(&self) -> bool {
        self.decl.modifiers.contains(Modifiers::READONLY)
    }

    pub fn is_internal(&self) -> bool {
        self.located.source.is_internal()
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.located.source.extension_name()
    }

    pub fn backing_type(&self) -> Option<String> {
        self.decl.backing_type.as_ref().map(ToString::to_string)
    }

    pub fn is_backed(&self) -> bool {
        self.decl.backing_type.is_some()
    }

    pub fn parent_class_name(&self) -> Option<String> {
        match self.decl.kind {
            ClassKind::Class => self.decl.extends.first().map(|name| name.resolved.clone()),
            _ => None,
        }
    }

    pub fn parent_class(&self) -> Result<Option<ReflectionClass>, ReflectionError> {
        match self.parent_class_name() {
            Some(name) => Ok(Some(self.reflector.reflect_class(&name)?)),
            None => Ok(None),
        }
    }

    /// Parent, grandparent and so on. Inheritance cycles end the chain.
    pub fn ancestors(&self) -> Result<Vec<ReflectionClass>, ReflectionError> {
        let mut seen = vec![self.name().to_ascii_lowercase()];
        let mut chain = Vec::new();
        let mut current = self.parent_class()?;
        while let Some(class) = current {
            let key = class.name().to_ascii_lowercase();
            if seen.contains(&key) {
                break;
            }
            seen.push(key);
            current = class.parent_class()?;
            chain.push(class);
        }
        Ok(chain)
    }

    fn direct_interface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.decl.kind {
            ClassKind::Interface => &self.decl.extends,
            _ => &self.decl.implements,
        }
        .iter()
        .map(|name| name.resolved.clone())
        .collect();
        if self.is_enum() {
            names.push("UnitEnum".to_string());
            if self.is_backed() {
                names.push("BackedEnum".to_string());
            }
        }
        names
    }

    /// Every interface this class implements, directly or through its
    /// parents and parent interfaces.
    pub fn interfaces(&self) -> Result<Vec<ReflectionClass>, ReflectionError> {
        let mut found: IndexMap<String, ReflectionClass> = IndexMap::new();
        let mut pending: Vec<String> = self.direct_interface_names();
        for ancestor in self.ancestors()? {
            pending.extend(ancestor.direct_interface_names());
        }
        pending.reverse();

        while let Some(name) = pending.pop() {
            let key = name.to_ascii_lowercase();
            if found.contains_key(&key) {
                continue;
            }
            let interface = match self.reflector.reflect_class(&name) {
                Ok(interface) => interface,
                Err(err) if err.is_not_found() && is_implicit_enum_interface(&name) => continue,
                Err(err) => return Err(err),
            };
            let mut parents = interface.direct_interface_names();
            parents.reverse();
            pending.extend(parents);
            found.insert(key, interface);
        }
        Ok(found.into_values().collect())
    }

    /// Enums always report `UnitEnum`, and `BackedEnum` when backed, even
    /// without stubs for them.
    pub fn interface_names(&self) -> Result<Vec<String>, ReflectionError> {
        let mut names: Vec<String> = self.interfaces()?.iter().map(ReflectionClass::name).collect();
        for implicit in self.direct_interface_names() {
            if is_implicit_enum_interface(&implicit)
                && !names.iter().any(|name| name.eq_ignore_ascii_case(&implicit))
            {
                names.push(implicit);
            }
        }
        Ok(names)
    }

    pub fn trait_names(&self) -> Vec<String> {
        self.decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::TraitUse { traits, .. } => Some(traits),
                _ => None,
            })
            .flatten()
            .map(|name| name.resolved.clone())
            .collect()
    }

    pub fn traits(&self) -> Result<Vec<ReflectionClass>, ReflectionError> {
        self.trait_names()
            .iter()
            .map(|name| self.reflector.reflect_class(name))
            .collect()
    }

    /// Constants declared in this class body.
    pub fn own_constants(&self) -> Vec<ReflectionClassConstant> {
        let interface = self.is_interface();
        self.decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Const {
                    modifiers,
                    ty,
                    consts,
                    doc_comment,
                    ..
                } => Some(consts.iter().map(move |constant| {
                    ReflectionClassConstant::new(
                        self.clone(),
                        constant,
                        *modifiers,
                        ty.clone(),
                        *doc_comment,
                        interface,
                    )
                })),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Own constants, then those of used traits, the parent chain and all
    /// interfaces. A name already seen is not replaced; private constants
    /// of ancestors are not inherited.
    pub fn constants(&self) -> Result<IndexMap<String, ReflectionClassConstant>, ReflectionError> {
        let mut constants = IndexMap::new();
        for constant in self.own_constants() {
            constants.entry(constant.name().to_string()).or_insert(constant);
        }
        for used in self.traits()? {
            for (name, constant) in used.constants()? {
                constants.entry(name).or_insert(constant);
            }
        }
        if let Some(parent) = self.parent_class()? {
            for (name, constant) in parent.constants()? {
                if constant.visibility() != Visibility::Private {
                    constants.entry(name).or_insert(constant);
                }
            }
        }
        for interface in self.interfaces()? {
            for constant in interface.own_constants() {
                constants.entry(constant.name().to_string()).or_insert(constant);
            }
        }
        Ok(constants)
    }

    pub fn constant(&self, name: &str) -> Result<Option<ReflectionClassConstant>, ReflectionError> {
        if let Some(own) = self
            .own_constants()
            .into_iter()
            .find(|constant| constant.name() == name)
        {
            return Ok(Some(own));
        }
        Ok(self.constants()?.shift_remove(name))
    }

    pub fn has_constant(&self, name: &str) -> Result<bool, ReflectionError> {
        Ok(self.constant(name)?.is_some())
    }

    pub fn cases(&self) -> Vec<ReflectionEnumCase> {
        if !self.is_enum() {
            return Vec::new();
        }
        self.decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Case {
                    name,
                    value,
                    doc_comment,
                    span,
                    ..
                } => Some(ReflectionEnumCase::new(
                    self.clone(),
                    name.clone(),
                    value.clone(),
                    *doc_comment,
                    *span,
                )),
                _ => None,
            })
            .collect()
    }

    pub fn case(&self, name: &str) -> Option<ReflectionEnumCase> {
        self.cases().into_iter().find(|case| case.name() == name)
    }

    /// Declared properties and promoted constructor parameters.
    pub fn own_properties(&self) -> Vec<ReflectionProperty> {
        let mut properties = Vec::new();
        for member in &self.decl.members {
            match member {
                ClassMember::Property {
                    modifiers,
                    ty,
                    entries,
                    doc_comment,
                    ..
                } => {
                    for entry in entries {
                        properties.push(ReflectionProperty::declared(
                            self.clone(),
                            entry,
                            *modifiers,
                            ty.clone(),
                            *doc_comment,
                        ));
                    }
                }
                ClassMember::Method(method) if method.name.short.eq_ignore_ascii_case("__construct") => {
                    for param in method.params.iter().filter(|param| param.is_promoted()) {
                        properties.push(ReflectionProperty::promoted(self.clone(), param));
                    }
                }
                _ => {}
            }
        }
        properties
    }

    pub fn properties(&self) -> Result<IndexMap<String, ReflectionProperty>, ReflectionError> {
        let mut properties = IndexMap::new();
        for property in self.own_properties() {
            properties.entry(property.name().to_string()).or_insert(property);
        }
        for used in self.traits()? {
            for (name, property) in used.properties()? {
                properties
                    .entry(name)
                    .or_insert_with(|| property.with_class(self.clone()));
            }
        }
        if let Some(parent) = self.parent_class()? {
            for (name, property) in parent.properties()? {
                if property.visibility() != Visibility::Private {
                    properties.entry(name).or_insert(property);
                }
            }
        }
        Ok(properties)
    }

    pub fn property(&self, name: &str) -> Result<Option<ReflectionProperty>, ReflectionError> {
        Ok(self.properties()?.shift_remove(name))
    }

    pub fn own_methods(&self) -> Vec<ReflectionMethod> {
        self.decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Method(decl) => Some(ReflectionMethod::new(self.clone(), decl.clone())),
                _ => None,
            })
            .collect()
    }

    /// Methods keyed by lowercased name: own, trait, inherited, then
    /// abstract interface methods not implemented anywhere.
    pub fn methods(&self) -> Result<IndexMap<String, ReflectionMethod>, ReflectionError> {
        let mut methods = IndexMap::new();
        for method in self.own_methods() {
            methods.entry(method.name().to_ascii_lowercase()).or_insert(method);
        }
        for used in self.traits()? {
            for (name, method) in used.methods()? {
                methods
                    .entry(name)
                    .or_insert_with(|| method.with_class(self.clone()));
            }
        }
        if let Some(parent) = self.parent_class()? {
            for (name, method) in parent.methods()? {
                if method.visibility() != Visibility::Private {
                    methods.entry(name).or_insert(method);
                }
            }
        }
        for interface in self.interfaces()? {
            for method in interface.own_methods() {
                methods.entry(method.name().to_ascii_lowercase()).or_insert(method);
            }
        }
        Ok(methods)
    }

    pub fn method(&self, name: &str) -> Result<Option<ReflectionMethod>, ReflectionError> {
        Ok(self.methods()?.shift_remove(&name.to_ascii_lowercase()))
    }

    pub fn has_method(&self, name: &str) -> Result<bool, ReflectionError> {
        Ok(self.method(name)?.is_some())
    }

    pub fn implements_interface(&self, name: &str) -> Result<bool, ReflectionError> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        Ok(self
            .interface_names()?
            .iter()
            .any(|interface| interface.eq_ignore_ascii_case(name)))
    }

    pub fn is_subclass_of(&self, name: &str) -> Result<bool, ReflectionError> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        if self.name().eq_ignore_ascii_case(name) {
            return Ok(false);
        }
        if self
            .ancestors()?
            .iter()
            .any(|ancestor| ancestor.name().eq_ignore_ascii_case(name))
        {
            return Ok(true);
        }
        self.implements_interface(name)
    }
}
