//! Class pool: named class handles backed by a layered classpath
//!
//! Lookups go through the cache first, then through the layers in the order
//! they were added. The compiler front end stacks them as built-in system
//! declarations, binary classpath entries, on-demand source compilation and
//! finally declaration stubs from the type model.

pub mod classpath;
pub mod compiling;
pub mod handle;
pub mod model;
pub mod resolve;
pub mod system;

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::ast::TypeName;
use crate::error::{Error, Result};

pub use classpath::{open_entries, parse_class_path, ClassPath, DirClassPath, JarClassPath};
pub use compiling::{CompilingClassPath, JavacCompiler, SourceCompiler};
pub use handle::{ClassHandle, FieldSig, MethodSig};
pub use model::ModelClassPath;
pub use resolve::Resolver;
pub use system::SystemClassPath;

pub struct ClassPool {
    classes: HashMap<String, ClassHandle>,
    layers: Vec<Box<dyn ClassPath>>,
    major_version: u16,
    validate: bool,
}

impl ClassPool {
    /// An empty pool without any layers
    pub fn new(major_version: u16, validate: bool) -> Self {
        Self { classes: HashMap::new(), layers: Vec::new(), major_version, validate }
    }

    /// A pool that knows the built-in system declarations
    pub fn with_system(major_version: u16, validate: bool) -> Self {
        let mut pool = Self::new(major_version, validate);
        pool.push_layer(Box::new(SystemClassPath::new()));
        pool
    }

    pub fn push_layer(&mut self, layer: Box<dyn ClassPath>) {
        debug!(layer = %layer.describe(), "added classpath layer");
        self.layers.push(layer);
    }

    pub fn major_version(&self) -> u16 {
        self.major_version
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Make sure `name` is cached, loading it through the layers; false when no layer has it
    fn load(&mut self, name: &str) -> Result<bool> {
        if self.classes.contains_key(name) {
            return Ok(true);
        }
        for layer in self.layers.iter_mut() {
            if let Some(bytes) = layer.open_class(name)? {
                let mut handle = ClassHandle::from_bytes(&bytes)?;
                if handle.name().as_str() != name {
                    return Err(Error::codegen(format!(
                        "{} provided class {} when asked for {name}",
                        layer.describe(),
                        handle.name()
                    )));
                }
                if layer.provides_stubs() {
                    handle.mark_stub();
                }
                trace!(class = name, layer = %layer.describe(), stub = handle.is_stub(), "loaded class");
                self.classes.insert(name.to_string(), handle);
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn find(&mut self, name: &str) -> Result<Option<&ClassHandle>> {
        if !self.load(name)? {
            return Ok(None);
        }
        Ok(self.classes.get(name))
    }

    pub fn get(&mut self, name: &str) -> Result<&ClassHandle> {
        if !self.load(name)? {
            return Err(Error::missing(name));
        }
        self.classes.get(name).ok_or_else(|| Error::missing(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut ClassHandle> {
        if !self.load(name)? {
            return Err(Error::missing(name));
        }
        self.classes.get_mut(name).ok_or_else(|| Error::missing(name))
    }

    /// Existing class, or a fresh public class extending `java.lang.Object`
    pub fn get_or_create(&mut self, name: &TypeName) -> Result<&mut ClassHandle> {
        if !self.load(name.as_str())? {
            debug!(class = %name, "creating class");
            self.classes.insert(name.to_string(), ClassHandle::new(name.clone(), self.major_version));
        }
        self.get_mut(name.as_str())
    }

    /// Publish a class, replacing any cached version
    pub fn insert(&mut self, handle: ClassHandle) {
        self.classes.insert(handle.name().to_string(), handle);
    }

    /// Take a class out of the cache for exclusive modification
    pub fn take(&mut self, name: &str) -> Result<ClassHandle> {
        if !self.load(name)? {
            return Err(Error::missing(name));
        }
        self.classes.remove(name).ok_or_else(|| Error::missing(name))
    }

    fn missing_supertype(&self, name: &TypeName, of: &TypeName) -> Result<()> {
        if self.validate {
            return Err(Error::missing(name.as_str()));
        }
        warn!(supertype = %name, class = %of, "cannot resolve supertype, skipping it");
        Ok(())
    }

    /// Direct supertypes of a class: superclass first, then interfaces
    fn direct_supertypes(handle: &ClassHandle) -> Result<Vec<TypeName>> {
        let mut supers = Vec::new();
        if let Some(superclass) = handle.superclass()? {
            supers.push(superclass);
        }
        supers.extend(handle.interfaces()?);
        Ok(supers)
    }

    /// Every class reachable through the supertypes of `roots`, breadth-first, roots included
    pub fn hierarchy_of(&mut self, roots: Vec<TypeName>) -> Result<Vec<TypeName>> {
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut queue: VecDeque<(TypeName, TypeName)> = roots.into_iter().map(|r| (r.clone(), r)).collect();
        let mut order = Vec::new();
        while let Some((name, from)) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if !self.load(name.as_str())? {
                self.missing_supertype(&name, &from)?;
                continue;
            }
            let handle = self.classes.get(name.as_str()).ok_or_else(|| Error::missing(name.as_str()))?;
            for parent in Self::direct_supertypes(handle)? {
                queue.push_back((parent, name.clone()));
            }
            order.push(name);
        }
        Ok(order)
    }

    /// All supertypes of `name`, excluding itself
    pub fn supertypes(&mut self, name: &TypeName) -> Result<Vec<TypeName>> {
        let mut all = self.hierarchy_of(vec![name.clone()])?;
        all.retain(|t| t != name);
        Ok(all)
    }

    /// Assignability of reference types
    pub fn is_subtype(&mut self, sub: &TypeName, sup: &TypeName) -> Result<bool> {
        if sub == sup || (sub.is_null() && sup.is_reference()) {
            return Ok(true);
        }
        if !sub.is_reference() || !sup.is_reference() {
            return Ok(false);
        }
        if sup.as_str() == crate::consts::JAVA_LANG_OBJECT {
            return Ok(true);
        }
        if sub.is_array() || sup.is_array() {
            if sub.is_array() && sup.is_array() {
                return self.is_subtype(&sub.element_type(), &sup.element_type());
            }
            return Ok(false);
        }
        Ok(self.supertypes(sub)?.contains(sup))
    }

    /// Methods called `name` visible from the given hierarchy roots; the first
    /// declaration of each descriptor wins
    pub fn collect_methods(&mut self, roots: Vec<TypeName>, name: &str) -> Result<Vec<MethodSig>> {
        let mut found: Vec<MethodSig> = Vec::new();
        for class in self.hierarchy_of(roots)? {
            let handle = self.get(class.as_str())?;
            for method in handle.methods()?.into_iter().filter(|m| m.name == name) {
                if !found.iter().any(|f| f.descriptor() == method.descriptor()) {
                    found.push(method);
                }
            }
        }
        Ok(found)
    }

    pub fn methods_named(&mut self, owner: &TypeName, name: &str) -> Result<Vec<MethodSig>> {
        self.collect_methods(vec![owner.clone()], name)
    }

    pub fn find_field_in(&mut self, roots: Vec<TypeName>, name: &str) -> Result<Option<FieldSig>> {
        for class in self.hierarchy_of(roots)? {
            let handle = self.get(class.as_str())?;
            if let Some(field) = handle.fields()?.into_iter().find(|f| f.name == name) {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    pub fn find_field(&mut self, owner: &TypeName, name: &str) -> Result<Option<FieldSig>> {
        self.find_field_in(vec![owner.clone()], name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
