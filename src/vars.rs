//! Named variable store backing frame fields.
//!
//! A [`VarBank`] holds one [`Var`] per name: the current value, the registered
//! unset (default) value, a set/unset flag, a metadata map, and zero or more
//! observers notified synchronously after every effective mutation.
//!
//! Every public accessor takes the bank's single mutex. Callers that need
//! several operations to happen atomically use [`VarBank::batch`], which runs
//! a closure against the unlocked [`VarMap`] view under one lock acquisition.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{errors::StoreError, value::Value};

/// Listener invoked synchronously after a variable changes: receives the
/// variable name, its new value, and whether it is now explicitly set.
pub type Observer = Box<dyn Fn(&str, &Value, bool) + Send>;

/// One named variable: current value, reset value, set-state, metadata.
pub struct Var {
    value: Value,
    unset_value: Value,
    is_set: bool,
    meta: HashMap<String, Value>,
    observers: Vec<Observer>,
}

impl Var {
    /// Deep copy of the variable. Observers are not carried over: listeners
    /// are bound to the original, not to copies.
    fn deep_copy(&self) -> Var {
        Var {
            value: self.value.clone(),
            unset_value: self.unset_value.clone(),
            is_set: self.is_set,
            meta: self.meta.clone(),
            observers: Vec::new(),
        }
    }

    fn notify(&self, name: &str) {
        for observer in &self.observers {
            observer(name, &self.value, self.is_set);
        }
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("value", &self.value)
            .field("is_set", &self.is_set)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// The unlocked variable map. Obtained through [`VarBank::batch`]; all methods
/// here assume the caller holds the bank's lock.
#[derive(Debug, Default)]
pub struct VarMap {
    vars: HashMap<String, Var>,
}

impl VarMap {
    /// Registers `name` with `unset_value` as both its initial and reset
    /// value, marked unset. Re-registering replaces the existing entry.
    pub fn init_var(&mut self, name: &str, unset_value: Value, meta: HashMap<String, Value>) {
        self.vars.insert(
            name.to_string(),
            Var {
                value: unset_value.clone(),
                unset_value,
                is_set: false,
                meta,
                observers: Vec::new(),
            },
        );
    }

    /// Sets `name` to `new_value`, coercing it to the variable's current kind.
    ///
    /// The write and its notification are suppressed when the variable is
    /// already set and the coerced value equals the current one.
    pub fn set(&mut self, name: &str, new_value: Value) -> Result<(), StoreError> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        let set_value = new_value.coerce_to(var.value.kind())?;
        if !var.is_set || var.value != set_value {
            var.value = set_value;
            var.is_set = true;
            var.notify(name);
        }
        Ok(())
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Result<Value, StoreError> {
        self.vars
            .get(name)
            .map(|var| var.value.clone())
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))
    }

    /// Current value of `name`, extracted into a concrete type.
    pub fn get_to<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: TryFrom<Value, Error = StoreError>,
    {
        self.get(name)?.try_into()
    }

    /// True iff `candidate`, coerced to the variable's kind, equals the
    /// current value. A failed coercion compares unequal rather than erroring.
    pub fn same(&self, name: &str, candidate: &Value) -> Result<bool, StoreError> {
        let var = self
            .vars
            .get(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        match candidate.coerce_to(var.value.kind()) {
            Ok(coerced) => Ok(var.value == coerced),
            Err(_) => Ok(false),
        }
    }

    /// Whether `name` has been explicitly set since registration or last unset.
    pub fn is_set(&self, name: &str) -> Result<bool, StoreError> {
        self.vars
            .get(name)
            .map(|var| var.is_set)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))
    }

    /// Resets `name` to its registered unset value and notifies observers.
    /// A variable that is not set stays untouched.
    pub fn unset(&mut self, name: &str) -> Result<(), StoreError> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        if var.is_set {
            var.is_set = false;
            var.value = var.unset_value.clone();
            var.notify(name);
        }
        Ok(())
    }

    /// Resets every variable to its unset value.
    pub fn unset_all(&mut self) {
        let names: Vec<String> = self.vars.keys().cloned().collect();
        for name in names {
            // Names come from the map itself.
            let _ = self.unset(&name);
        }
    }

    /// Reads the metadata entry `key` of `name`.
    pub fn meta(&self, name: &str, key: &str) -> Result<Value, StoreError> {
        let var = self
            .vars
            .get(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        var.meta
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::UnknownMeta {
                name: name.to_string(),
                key: key.to_string(),
            })
    }

    /// Writes the metadata entry `key` of `name`.
    pub fn set_meta(&mut self, name: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        var.meta.insert(key.to_string(), value);
        Ok(())
    }

    /// Attaches a listener to `name`, invoked synchronously after every
    /// effective set or unset.
    pub fn observe(&mut self, name: &str, observer: Observer) -> Result<(), StoreError> {
        let var = self
            .vars
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownVar(name.to_string()))?;

        var.observers.push(observer);
        Ok(())
    }

    fn deep_copy(&self) -> VarMap {
        VarMap {
            vars: self
                .vars
                .iter()
                .map(|(name, var)| (name.clone(), var.deep_copy()))
                .collect(),
        }
    }
}

/// Synchronized variable store: a [`VarMap`] behind one mutex.
#[derive(Debug, Default)]
pub struct VarBank {
    inner: Mutex<VarMap>,
}

impl VarBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VarMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the unlocked map under a single lock acquisition,
    /// making a multi-operation update atomic.
    pub fn batch<R>(&self, f: impl FnOnce(&mut VarMap) -> R) -> R {
        f(&mut self.lock())
    }

    /// See [`VarMap::init_var`].
    pub fn init_var(&self, name: &str, unset_value: Value, meta: HashMap<String, Value>) {
        self.lock().init_var(name, unset_value, meta);
    }

    /// See [`VarMap::set`].
    pub fn set(&self, name: &str, new_value: Value) -> Result<(), StoreError> {
        self.lock().set(name, new_value)
    }

    /// See [`VarMap::get`].
    pub fn get(&self, name: &str) -> Result<Value, StoreError> {
        self.lock().get(name)
    }

    /// See [`VarMap::get_to`].
    pub fn get_to<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: TryFrom<Value, Error = StoreError>,
    {
        self.lock().get_to(name)
    }

    /// See [`VarMap::same`].
    pub fn same(&self, name: &str, candidate: &Value) -> Result<bool, StoreError> {
        self.lock().same(name, candidate)
    }

    /// See [`VarMap::is_set`].
    pub fn is_set(&self, name: &str) -> Result<bool, StoreError> {
        self.lock().is_set(name)
    }

    /// See [`VarMap::unset`].
    pub fn unset(&self, name: &str) -> Result<(), StoreError> {
        self.lock().unset(name)
    }

    /// See [`VarMap::unset_all`].
    pub fn unset_all(&self) {
        self.lock().unset_all();
    }

    /// See [`VarMap::meta`].
    pub fn meta(&self, name: &str, key: &str) -> Result<Value, StoreError> {
        self.lock().meta(name, key)
    }

    /// See [`VarMap::set_meta`].
    pub fn set_meta(&self, name: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock().set_meta(name, key, value)
    }

    /// See [`VarMap::observe`].
    pub fn observe(&self, name: &str, observer: Observer) -> Result<(), StoreError> {
        self.lock().observe(name, observer)
    }

    /// Independent deep copy of the bank. Byte-array values are copied by
    /// content; observers are not carried over.
    pub fn deep_copy(&self) -> VarBank {
        VarBank {
            inner: Mutex::new(self.lock().deep_copy()),
        }
    }
}
