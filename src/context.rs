//! The `Context` holds every piece of state of a running simulation.
//!
//! State is partitioned into *data plugins*: each component (people, town, infection
//! bookkeeping, ...) declares a unique plugin type with [`define_data_plugin!`] and keeps its data
//! in the container associated with that type. Components then expose their behavior as
//! extension traits on `Context`, so a model is assembled by calling each component's `init`
//! function and then driving the day/hour clock.
//!
//! The clock is discrete: a simulation advances one hour at a time within a day, and days are
//! numbered from zero (the day the outbreak is seeded).
use std::any::{type_name, Any, TypeId};

use crate::{HashMap, HashMapExt};

/// A trait for objects that can provide data containers to be held by `Context`
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in Context.
#[macro_export]
macro_rules! define_data_plugin {
    ($plugin:ident, $data_container:ty, $default: expr) => {
        struct $plugin;

        impl $crate::context::DataPlugin for $plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

/// The basic operations every extension trait builds on.
pub trait ContextBase: Sized {
    /// Retrieves a mutable reference to the data container associated with a `DataPlugin`,
    /// creating it if this is the first access.
    fn get_data_mut<T: DataPlugin>(&mut self, plugin: T) -> &mut T::DataContainer;

    /// Retrieves a reference to the data container associated with a `DataPlugin`.
    ///
    /// # Panics
    ///
    /// Panics if the container has never been created, which means the component that owns it
    /// was not initialized.
    fn get_data<T: DataPlugin>(&self, plugin: T) -> &T::DataContainer;

    /// Like `get_data`, but returns `None` for a container that was never created.
    fn try_get_data<T: DataPlugin>(&self, plugin: T) -> Option<&T::DataContainer>;

    fn get_current_day(&self) -> usize;
    fn get_current_hour(&self) -> usize;
}

pub struct Context {
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_day: usize,
    current_hour: usize,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            data_plugins: HashMap::new(),
            current_day: 0,
            current_hour: 0,
        }
    }

    pub(crate) fn set_current_day(&mut self, day: usize) {
        self.current_day = day;
        self.current_hour = 0;
    }

    pub(crate) fn set_current_hour(&mut self, hour: usize) {
        assert!(hour < 24, "Invalid hour of day {hour}");
        self.current_hour = hour;
    }
}

impl ContextBase for Context {
    fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .expect("data plugin container has the wrong type")
    }

    fn get_data<T: DataPlugin>(&self, plugin: T) -> &T::DataContainer {
        self.try_get_data(plugin).unwrap_or_else(|| {
            panic!(
                "data plugin {} has not been initialized",
                type_name::<T>()
            )
        })
    }

    fn try_get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|container| container.downcast_ref::<T::DataContainer>())
    }

    fn get_current_day(&self) -> usize {
        self.current_day
    }

    fn get_current_hour(&self) -> usize {
        self.current_hour
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
