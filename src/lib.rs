//! An agent-based model of an epidemic spreading through a synthetic town.
//!
//! Residents live in households and follow age-dependent daily routines that take them to
//! schools, workplaces, transit, entertainment venues and the outdoors. Every simulated hour
//! each location is filled according to those routines and every infectious person meets some
//! of the people sharing their location, possibly infecting them. Infections run their course
//! under an SIR or SIS model, some patients need a hospital bed, and a daily emergency policy
//! reacts to prevalence by closing schools, sending workers home, capping venues and mandating
//! masks.
//!
//! The central object is the [`Context`], which owns all simulation state as data plugins and
//! is extended by each component:
//! * [`population_loader`] generates families, people and the town they live in.
//! * [`routine`] builds each person's default 24-hour routine and derives the routine to follow
//!   under an emergency level.
//! * [`occupancy`] places everyone every hour, honoring capacity limits.
//! * [`transmission_manager`] samples contacts and runs transmission trials.
//! * [`infection_manager`] moves people through the epidemic state machine.
//! * [`emergency`] maps prevalence to an emergency level.
//! * [`simulation`] drives the day/hour clock and records a [`DailyResult`] per day.
//!
//! ```no_run
//! use epitown::prelude::*;
//!
//! let results = epitown::simulation::run(Params {
//!     population: 1000,
//!     simulation_days: 30,
//!     r0: 2.0,
//!     ..Params::default()
//! })
//! .unwrap();
//! println!("{:?}", results.last());
//! ```
pub mod context;
pub mod emergency;
pub mod error;
pub mod event_log;
pub mod global_properties;
mod hashing;
pub mod infection_manager;
pub mod log;
pub mod numeric;
pub mod occupancy;
pub mod parameters;
pub mod people;
pub mod population_loader;
pub mod prelude;
pub mod progress;
pub mod random;
pub mod report;
pub mod routine;
pub mod runner;
pub mod simulation;
pub mod town;
pub mod transmission_manager;

pub use context::{Context, ContextBase};
pub use error::EpiError;
pub use hashing::{hash_str, HashMap, HashMapExt, HashSet, HashSetExt};
pub use simulation::DailyResult;

// Re-exported for use in macros
pub use csv;
pub use paste;
pub use rand;
