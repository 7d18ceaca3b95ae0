use std::process::ExitCode;

use epitown::runner::run_from_cli;
use epitown::simulation::ContextSimulationExt;
use epitown::town::LocationCategory;
use epitown::transmission_manager::ContextTransmissionExt;

fn main() -> ExitCode {
    let context = match run_from_cli() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("epitown: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("day,susceptible,infectious,recovered,level");
    for result in context.daily_results() {
        println!(
            "{},{:.2},{:.2},{:.2},{}",
            result.day,
            result.percent_susceptible,
            result.percent_infectious,
            result.percent_recovered,
            result.emergency_level
        );
    }

    println!("\ninfections by location:");
    let tally = context.infections_by_location();
    for category in LocationCategory::ALL {
        println!("{category:>16} {}", tally[category.index()]);
    }
    ExitCode::SUCCESS
}
