//! The day/hour scheduler.
//!
//! Day 0 is set-up: the population and town are generated, the outbreak is seeded and the
//! initial state is recorded. Each following day runs, in order:
//!
//! 1. emergency level evaluation (and routine regeneration if it changed),
//! 2. 24 hourly ticks, each clearing and refilling every location and then running contacts,
//! 3. the recoveries due that day,
//! 4. the hospital admissions due that day,
//!
//! after which a [`DailyResult`] is recorded and the progress callback is invoked.
use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::emergency::{ContextEmergencyExt, EmergencyLevel};
use crate::error::EpiError;
use crate::infection_manager::{self, ContextInfectionExt};
use crate::log::{debug, info};
use crate::occupancy::ContextOccupancyExt;
use crate::parameters::{ContextParametersExt, Params};
use crate::people::{ContextPeopleExt, InfectionStatus, PersonId};
use crate::population_loader;
use crate::progress::ContextProgressExt;
use crate::report::{define_report, ContextReportExt};
use crate::routine::HOURS_PER_DAY;
use crate::transmission_manager::ContextTransmissionExt;

/// The state of the population at the end of a day. Percentages are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub day: usize,
    pub percent_susceptible: f64,
    pub percent_infectious: f64,
    pub percent_recovered: f64,
    pub emergency_level: EmergencyLevel,
}

define_report!(DailyResult);

define_data_plugin!(SimulationPlugin, Vec<DailyResult>, Vec::new());

pub trait ContextSimulationExt {
    /// Stores `params`, generates the town and its people, seeds the outbreak and records day
    /// 0. Reports added before this call receive the day 0 row.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the parameters are invalid or the simulation was already set up.
    fn init_simulation(&mut self, params: Params) -> Result<(), EpiError>;

    /// Runs one hourly tick of the current day: everyone moves to where their routine says,
    /// then the infectious meet the people around them. Returns the people newly infected.
    fn run_hour(&mut self, hour: usize) -> Vec<PersonId>;

    /// Runs one whole day.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if `day` is past the configured number of days.
    ///
    /// Returns [`EpiError::InvariantViolation`] (debug builds only) if the compartments no
    /// longer partition the population at the end of the day.
    fn run_day(&mut self, day: usize) -> Result<DailyResult, EpiError>;

    /// Runs every configured day and returns the results of day 0 onwards.
    ///
    /// # Errors
    ///
    /// See [`ContextSimulationExt::run_day`].
    fn run_simulation(&mut self) -> Result<Vec<DailyResult>, EpiError>;

    /// Records and reports the current state of the population.
    fn record_daily_result(&mut self) -> DailyResult;

    fn daily_results(&self) -> &[DailyResult];
}

impl ContextSimulationExt for Context {
    fn init_simulation(&mut self, params: Params) -> Result<(), EpiError> {
        self.init_parameters(params)?;
        population_loader::init(self)?;
        infection_manager::init(self)?;
        self.set_current_day(0);
        let seeded = self.seed_infections();
        info!(
            "simulating {} people, {} initially infectious",
            self.get_current_population(),
            seeded.len()
        );
        self.record_daily_result();
        Ok(())
    }

    fn run_hour(&mut self, hour: usize) -> Vec<PersonId> {
        self.set_current_hour(hour);
        self.update_occupancy();
        self.run_transmission()
    }

    fn run_day(&mut self, day: usize) -> Result<DailyResult, EpiError> {
        let total_days = self.get_params().simulation_days;
        if day > total_days {
            return Err(EpiError::EpiError(format!(
                "cannot run day {day}: the simulation covers {total_days} days"
            )));
        }
        self.set_current_day(day);
        self.update_emergency_level();

        let mut infected = 0;
        for hour in 0..HOURS_PER_DAY {
            infected += self.run_hour(hour).len();
        }

        let recovered = self.process_recoveries(day);
        let admitted = self.process_hospitalizations(day);
        debug!(
            "day {day}: {infected} new infections, {recovered} recoveries, \
             {admitted} hospital admissions due"
        );

        if cfg!(debug_assertions) {
            self.check_conservation()?;
        }
        let result = self.record_daily_result();
        info!(
            "day {day}: S={} I={} R={} level={}",
            self.count_status(InfectionStatus::Susceptible),
            self.count_status(InfectionStatus::Infectious),
            self.count_status(InfectionStatus::Recovered),
            result.emergency_level
        );
        self.report_progress(day, total_days);
        Ok(result)
    }

    fn run_simulation(&mut self) -> Result<Vec<DailyResult>, EpiError> {
        let total_days = self.get_params().simulation_days;
        for day in 1..=total_days {
            self.run_day(day)?;
        }
        Ok(self.daily_results().to_vec())
    }

    fn record_daily_result(&mut self) -> DailyResult {
        let result = DailyResult {
            day: self.get_current_day(),
            percent_susceptible: self.status_percentage(InfectionStatus::Susceptible),
            percent_infectious: self.status_percentage(InfectionStatus::Infectious),
            percent_recovered: self.status_percentage(InfectionStatus::Recovered),
            emergency_level: self.get_emergency_level(),
        };
        self.get_data_mut(SimulationPlugin).push(result.clone());
        self.send_report(result.clone());
        result
    }

    fn daily_results(&self) -> &[DailyResult] {
        self.try_get_data(SimulationPlugin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Sets up and runs a simulation with no reports.
///
/// # Errors
///
/// Returns an `EpiError` if the parameters are invalid.
pub fn run(params: Params) -> Result<Vec<DailyResult>, EpiError> {
    let mut context = Context::new();
    context.init_simulation(params)?;
    context.run_simulation()
}
