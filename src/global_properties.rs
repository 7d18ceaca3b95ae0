//! Global properties are named, validated, read-mostly values shared by every component of a
//! simulation (the model parameters being the main one).
//!
//! A property is declared with [`define_global_property!`], which gives it a value type, a
//! validation function and a name of the form `<crate>.<Ident>`. Values can be set directly or
//! loaded from a JSON file whose top-level object is keyed by those names:
//!
//! ```json
//! { "epitown.Parameters": { "population": 1000, "simulation_days": 30 } }
//! ```
//!
//! A value is validated every time it is set and can only be set once per `Context`.
use std::any::{Any, TypeId};
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::context::{Context, ContextBase};
use crate::error::EpiError;
use crate::log::trace;
use crate::{define_data_plugin, HashMap, HashMapExt};

#[macro_export]
macro_rules! define_global_property {
    ($global_property:ident, $value:ty, $validate: expr) => {
        #[derive(Copy, Clone)]
        pub struct $global_property;

        impl $crate::global_properties::GlobalProperty for $global_property {
            type Value = $value;

            fn name() -> String {
                let module = module_path!();
                let crate_name = module.split("::").next().unwrap_or(module);
                format!("{}.{}", crate_name, stringify!($global_property))
            }

            fn validate(val: &$value) -> Result<(), $crate::error::EpiError> {
                $validate(val)
            }
        }
    };

    ($global_property: ident, $value: ty) => {
        $crate::define_global_property!($global_property, $value, |_| { Ok(()) });
    };
}
pub use define_global_property;

pub trait GlobalProperty: Any {
    type Value: Any + DeserializeOwned;

    /// The key under which the property is found in a JSON properties file.
    fn name() -> String;

    /// # Errors
    ///
    /// Returns an `EpiError` describing why the value is not acceptable.
    fn validate(value: &Self::Value) -> Result<(), EpiError>;
}

struct GlobalPropertiesDataContainer {
    global_property_container: HashMap<TypeId, Box<dyn Any>>,
}

define_data_plugin!(
    GlobalPropertiesPlugin,
    GlobalPropertiesDataContainer,
    GlobalPropertiesDataContainer {
        global_property_container: HashMap::new(),
    }
);

pub trait ContextGlobalPropertiesExt: ContextBase {
    /// Validates and stores the value of a global property.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the value fails validation or the property already has a value.
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        _property: T,
        value: T::Value,
    ) -> Result<(), EpiError> {
        T::validate(&value)?;
        let container = &mut self
            .get_data_mut(GlobalPropertiesPlugin)
            .global_property_container;
        if container.contains_key(&TypeId::of::<T>()) {
            return Err(EpiError::EpiError(format!(
                "global property {} is already set",
                T::name()
            )));
        }
        container.insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    /// Returns the value of a global property, or `None` if it was never set.
    fn get_global_property_value<T: GlobalProperty>(&self, _property: T) -> Option<&T::Value> {
        self.try_get_data(GlobalPropertiesPlugin)?
            .global_property_container
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T::Value>())
    }

    /// Reads the value of `property` from the JSON object in `file_name`, keyed by the
    /// property's name, then sets it.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the file cannot be read or parsed, does not contain the key, or
    /// the value fails validation.
    fn load_global_property<T: GlobalProperty>(
        &mut self,
        property: T,
        file_name: &Path,
    ) -> Result<(), EpiError> {
        let value = read_global_property::<T>(file_name)?;
        self.set_global_property_value(property, value)
    }
}

/// Reads the value of a global property from a JSON properties file without storing it, so it
/// can be adjusted before it is set. The value is not validated.
///
/// # Errors
///
/// Returns an `EpiError` if the file cannot be read or parsed, or does not contain the key.
pub fn read_global_property<T: GlobalProperty>(file_name: &Path) -> Result<T::Value, EpiError> {
    trace!("loading global property {} from {file_name:?}", T::name());
    let contents = fs::read_to_string(file_name)?;
    let mut properties: HashMap<String, serde_json::Value> = serde_json::from_str(&contents)?;
    let value = properties.remove(&T::name()).ok_or_else(|| {
        EpiError::ConfigurationError(format!(
            "{} does not define {}",
            file_name.display(),
            T::name()
        ))
    })?;
    Ok(serde_json::from_value(value)?)
}

impl ContextGlobalPropertiesExt for Context {}
