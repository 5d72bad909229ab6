use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use log::{error, info, trace};
use sat_query::parser;
use sat_query::{Literal, Problem, Result, Solver, SolverOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Print the parsed problem back as DIMACS
    Print,
    /// Run a bounded satisfiability check
    Check,
    /// Build the prediction query after propagation
    Query,
    /// Ask the engine for a depth-1 branching decision
    Cube,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    input: String,

    #[arg(value_enum, default_value_t = Action::Query, long)]
    action: Action,

    /// Assumed DIMACS literals, e.g. `--assume 1,-3`
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    assume: Vec<i32>,

    #[arg(default_value_t = String::from("dlis"), long)]
    reward: String,

    #[arg(default_value_t = 0, long)]
    max_conflicts: u32,

    #[arg(default_value_t = 0, long)]
    max_restarts: u32,

    #[arg(long)]
    delta_fraction: Option<f32>,
}

fn bind(problem: Problem, args: &Args) -> Result<(Solver, Vec<Literal>)> {
    let mut opts = SolverOptions::new(args.max_conflicts, args.max_restarts);
    if let Some(fraction) = args.delta_fraction {
        opts = opts.with_lookahead_delta_fraction(fraction);
    }
    let assumptions = args
        .assume
        .iter()
        .map(|i| Literal::from_ilit(*i))
        .collect::<Result<Vec<_>>>()?;
    Ok((Solver::new(Arc::new(problem), opts)?, assumptions))
}

fn run(args: Args) -> Result<()> {
    let problem = parser::parse_dimacs(&args.input)?;
    let solver = match args.action {
        Action::Print => {
            print!("{}", parser::to_dimacs(&problem));
            return Ok(());
        }
        Action::Check => {
            let (mut solver, assumptions) = bind(problem, &args)?;
            let (status, core) = solver.check_core(&assumptions)?;
            info!(target: "solver", "status: {}", status);
            println!("{}", status);
            if !core.is_empty() {
                let core: Vec<String> = core.iter().map(|l| l.to_string()).collect();
                println!("core: {}", core.join(" "));
            }
            solver
        }
        Action::Query => {
            let (mut solver, assumptions) = bind(problem, &args)?;
            let query = solver.to_query(&assumptions)?;
            info!(
                target: "solver",
                "query has {} free vars and {} cells",
                query.free_vars.len(),
                query.n_cells()
            );
            let free: Vec<String> = query.free_vars.iter().map(|v| v.to_string()).collect();
            println!("free: {}", free.join(" "));
            for [lit, clause] in query.incidence.iter() {
                println!("{} {}", lit, clause);
            }
            solver
        }
        Action::Cube => {
            let (mut solver, assumptions) = bind(problem, &args)?;
            let outcome = solver.cube(&assumptions, &args.reward)?;
            info!(target: "solver", "cube: {}", outcome);
            println!("{}", outcome);
            solver
        }
    };
    trace!(target: "solver", "{}", solver);
    info!(target: "profiler", "Profiling results: {}", solver.profiler());
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    info!(target: "solver", "{:?}", args);

    if let Err(e) = run(args) {
        error!(target: "solver", "{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
