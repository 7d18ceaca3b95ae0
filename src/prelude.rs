pub use crate::context::{Context, ContextBase};
pub use crate::emergency::{ContextEmergencyExt, EmergencyLevel};
pub use crate::error::EpiError;
pub use crate::global_properties::ContextGlobalPropertiesExt;
pub use crate::infection_manager::ContextInfectionExt;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::occupancy::ContextOccupancyExt;
pub use crate::parameters::{ContextParametersExt, ModelType, Params};
pub use crate::people::{AgeGroup, ContextPeopleExt, InfectionStatus, PersonId};
pub use crate::progress::ContextProgressExt;
pub use crate::random::ContextRandomExt;
pub use crate::report::ContextReportExt;
pub use crate::routine::{ContextRoutineExt, Routine};
pub use crate::simulation::{ContextSimulationExt, DailyResult};
pub use crate::town::{ContextTownExt, LocationCategory, LocationRef};
pub use crate::transmission_manager::ContextTransmissionExt;
pub use crate::{define_data_plugin, define_global_property, define_report, define_rng};
