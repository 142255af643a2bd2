use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use snn_pipeline::config::brunel::BrunelConfig;
use snn_pipeline::config::load_neuron_parameters;
use snn_pipeline::config::metadata::RunMetadata;
use snn_pipeline::config::multiarea::MultiAreaInputs;
use snn_pipeline::config::simulation::SimulationConfig;
use snn_pipeline::core::scaling::ScaleFactors;
use snn_pipeline::core::spikes::{load_spikes, save_spikes};
use snn_pipeline::core::statistics::{calculate_statistics, load_statistics, save_statistics};
use snn_pipeline::engine::surrogate::{SurrogateEngine, DEFAULT_SURROGATE_RATE};
use snn_pipeline::io::npy::NpyArray;
use snn_pipeline::io::{ensure_extension, save_spike_array};
use snn_pipeline::plot::connectivity::connectivity_plot;
use snn_pipeline::plot::phase_diagram::{phase_diagram_plot, PhaseDiagramOptions, PhasePoint};
use snn_pipeline::plot::raster::raster_plot;
use snn_pipeline::plot::statistics::statistics_plot;
use snn_pipeline::simulation::brunel::simulate_brunel;
use snn_pipeline::simulation::multiarea::simulate_multiarea;

/// Configure, run and post-process spiking network simulations
#[derive(Parser, Debug)]
#[command(name = "snn-pipeline", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Firing rate of the surrogate neurons in spikes/s
    #[arg(long = "surrogate_rate", global = true, default_value_t = DEFAULT_SURROGATE_RATE)]
    surrogate_rate: f64,

    /// Number of emulated processes
    #[arg(long = "num_processes", global = true, default_value_t = 1)]
    num_processes: usize,

    /// Write the declarations made on the engine to this JSON file
    #[arg(long, global = true)]
    plan: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a Brunel network, save the excitatory spikes and plot them
    SimulateBrunel(SimulateBrunelArgs),
    /// Plot the CV of Brunel runs over the (g, nu_ex) plane
    PlotPhaseDiagram(PlotPhaseDiagramArgs),
    /// Simulate a multi-area network
    SimulateMultiarea(SimulateMultiareaArgs),
    /// Plot the recurrent connectivity of a multi-area network
    PlotConnectivity {
        synapse_file: PathBuf,
        plot_file: PathBuf,
    },
    /// Calculate the average rate and CV of every population
    CalculateStatistics {
        spikes_file: PathBuf,
        simconfig_file: PathBuf,
        statistics_file: PathBuf,
    },
    /// Plot the distributions of rates and CVs
    PlotStatistics {
        statistics_file: PathBuf,
        plot_file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SimulateBrunelArgs {
    /// YAML network configuration
    network_file: PathBuf,
    /// Output .npy file with the ids and times of the recorded excitatory spikes
    spikefile: PathBuf,
    /// Output raster plot (.svg)
    rasterfile: PathBuf,

    /// Simulation time in ms
    #[arg(long, default_value_t = 500.0)]
    simtime: f64,
    /// Simulation time step in ms
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
    /// Relative inhibitory to excitatory synaptic weight (w_I = -g * w_E)
    #[arg(long, default_value_t = 5.0)]
    g: f64,
    /// External rate relative to threshold rate
    #[arg(long = "nu_ex", default_value_t = 2.0)]
    nu_ex: f64,
    /// Scaling factor for the number of neurons
    #[arg(long = "N_scale", default_value_t = 0.5)]
    n_scale: f64,
    /// Minimal time plotted
    #[arg(long = "raster_tmin", default_value_t = 400.0)]
    raster_tmin: f64,
    /// Maximal time plotted
    #[arg(long = "raster_tmax", default_value_t = 500.0)]
    raster_tmax: f64,
    /// Master seed for random numbers
    #[arg(long = "master_seed", default_value_t = 0)]
    master_seed: u64,
    /// Number of threads per process
    #[arg(long = "num_threads", default_value_t = 1)]
    num_threads: usize,
}

#[derive(Args, Debug)]
struct PlotPhaseDiagramArgs {
    /// Output plot (.svg)
    plotfile: PathBuf,
    /// Brunel spike files
    #[arg(required = true)]
    spikefiles: Vec<PathBuf>,

    /// Minimal g plotted
    #[arg(long = "g_min", default_value_t = 1.0)]
    g_min: f64,
    /// Maximal g plotted
    #[arg(long = "g_max", default_value_t = 8.0)]
    g_max: f64,
    /// Minimal nu_ex plotted
    #[arg(long = "nu_ex_min", default_value_t = 0.0)]
    nu_ex_min: f64,
    /// Maximal nu_ex plotted
    #[arg(long = "nu_ex_max", default_value_t = 4.0)]
    nu_ex_max: f64,
    /// Minimal CV of the colour scale
    #[arg(long = "CV_min", default_value_t = 0.0)]
    cv_min: f64,
    /// Maximal CV of the colour scale
    #[arg(long = "CV_max", default_value_t = 1.0)]
    cv_max: f64,
    /// Marker area
    #[arg(long, default_value_t = 500.0)]
    markersize: f64,
}

#[derive(Args, Debug)]
struct SimulateMultiareaArgs {
    /// YAML neuron parameters
    neuron_parameter_file: PathBuf,
    /// .npy names of all populations
    structure_file: PathBuf,
    /// .npy number of neurons per population
    neuron_file: PathBuf,
    /// .npy number of synapses, P x (P + 1)
    synapse_file: PathBuf,
    /// .npy average weights, P x (P + 1)
    weight_file: PathBuf,
    /// Output JSON spikes of every population
    spikes_file: PathBuf,
    /// Output YAML simulation configuration
    simconfig_file: PathBuf,

    /// Simulation time in ms
    #[arg(long, default_value_t = 500.0)]
    simtime: f64,
    /// Simulation time step in ms
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
    /// Master seed for random numbers
    #[arg(long = "master_seed", default_value_t = 0)]
    master_seed: u64,
    /// Number of threads per process
    #[arg(long = "num_threads", default_value_t = 1)]
    num_threads: usize,
    /// Mean initial membrane potential
    #[arg(long = "V0_mean", default_value_t = -58.0, allow_hyphen_values = true)]
    v0_mean: f64,
    /// Standard deviation of the initial membrane potential
    #[arg(long = "V0_std", default_value_t = 10.0)]
    v0_std: f64,
    /// Rate of the external Poisson input
    #[arg(long = "nu_ext", default_value_t = 5.0)]
    nu_ext: f64,
    /// Scaling factor for the number of neurons
    #[arg(long = "N_scale", default_value_t = 0.01)]
    n_scale: f64,
    /// Scaling factor for the indegree
    #[arg(long = "K_scale", default_value_t = 0.01)]
    k_scale: f64,
}

impl EngineArgs {
    fn engine(&self) -> Result<SurrogateEngine> {
        let engine = SurrogateEngine::new(self.surrogate_rate)?.with_num_processes(self.num_processes)?;
        Ok(engine)
    }

    fn save_plan(&self, engine: &SurrogateEngine) -> Result<()> {
        if let Some(path) = &self.plan {
            engine
                .save_plan(path)
                .with_context(|| format!("cannot write the plan to {}", path.display()))?;
            info!("Plan written to {}", path.display());
        }
        Ok(())
    }
}

fn simulate_brunel_command(args: &SimulateBrunelArgs, engine_args: &EngineArgs) -> Result<()> {
    ensure_extension(&args.spikefile, "npy")?;
    ensure_extension(&args.rasterfile, "svg")?;

    let factors = ScaleFactors::build(args.n_scale, 1.0)?;
    let config = BrunelConfig::load(&args.network_file)
        .with_context(|| format!("cannot load {}", args.network_file.display()))?
        .with_drive(args.g, args.nu_ex)
        .scaled(&factors)?;
    let simulation = SimulationConfig {
        simtime: args.simtime,
        dt: args.dt,
        master_seed: args.master_seed,
        num_threads: args.num_threads,
        ..Default::default()
    };

    let mut engine = engine_args.engine()?;
    let spikes = simulate_brunel(&mut engine, &config, &simulation)?;
    engine_args.save_plan(&engine)?;

    let excitatory = spikes.excitatory;
    save_spike_array(&args.spikefile, &excitatory.senders, &excitatory.times)
        .with_context(|| format!("cannot write {}", args.spikefile.display()))?;
    RunMetadata {
        g: args.g,
        nu_ex: args.nu_ex,
        n_scale: args.n_scale,
        simtime: args.simtime,
        dt: args.dt,
        master_seed: args.master_seed,
    }
    .save_for(&args.spikefile)?;
    info!("Spikes written to {}", args.spikefile.display());

    raster_plot(
        &args.rasterfile,
        &excitatory.senders,
        &excitatory.times,
        (args.raster_tmin, args.raster_tmax),
    )?;
    Ok(())
}

fn plot_phase_diagram_command(args: &PlotPhaseDiagramArgs) -> Result<()> {
    let points = args
        .spikefiles
        .iter()
        .map(|spikefile| {
            PhasePoint::from_spike_file(spikefile)
                .with_context(|| format!("cannot process {}", spikefile.display()))
        })
        .collect::<Result<Vec<PhasePoint>>>()?;
    let options = PhaseDiagramOptions {
        g_range: (args.g_min, args.g_max),
        nu_ex_range: (args.nu_ex_min, args.nu_ex_max),
        cv_range: (args.cv_min, args.cv_max),
        markersize: args.markersize,
    };
    phase_diagram_plot(&args.plotfile, &points, &options)?;
    Ok(())
}

fn simulate_multiarea_command(args: &SimulateMultiareaArgs, engine_args: &EngineArgs) -> Result<()> {
    let neuron_parameters = load_neuron_parameters(&args.neuron_parameter_file)
        .with_context(|| format!("cannot load {}", args.neuron_parameter_file.display()))?;
    let inputs = MultiAreaInputs::load(
        &args.structure_file,
        &args.neuron_file,
        &args.synapse_file,
        &args.weight_file,
    )
    .context("cannot load the multi-area network arrays")?;
    let network = inputs.scaled(&ScaleFactors::build(args.n_scale, args.k_scale)?)?;

    let simulation = SimulationConfig {
        simtime: args.simtime,
        dt: args.dt,
        v0_mean: args.v0_mean,
        v0_std: args.v0_std,
        master_seed: args.master_seed,
        num_threads: args.num_threads,
    };

    let mut engine = engine_args.engine()?;
    let spikes = simulate_multiarea(
        &mut engine,
        &network,
        &neuron_parameters,
        args.nu_ext,
        &simulation,
    )?;
    engine_args.save_plan(&engine)?;

    save_spikes(&spikes, &args.spikes_file)
        .with_context(|| format!("cannot write {}", args.spikes_file.display()))?;
    info!("Spikes written to {}", args.spikes_file.display());
    simulation
        .save_to(&args.simconfig_file)
        .with_context(|| format!("cannot write {}", args.simconfig_file.display()))?;
    info!("Simulation configuration written to {}", args.simconfig_file.display());
    Ok(())
}

fn plot_connectivity_command(synapse_file: &Path, plot_file: &Path) -> Result<()> {
    let synapses = NpyArray::load(synapse_file)
        .and_then(|array| array.to_matrix())
        .with_context(|| format!("cannot load {}", synapse_file.display()))?;
    connectivity_plot(plot_file, &synapses)?;
    Ok(())
}

fn calculate_statistics_command(
    spikes_file: &Path,
    simconfig_file: &Path,
    statistics_file: &Path,
) -> Result<()> {
    let spikes = load_spikes(spikes_file)
        .with_context(|| format!("cannot load {}", spikes_file.display()))?;
    let simulation = SimulationConfig::load(simconfig_file)
        .with_context(|| format!("cannot load {}", simconfig_file.display()))?;

    let statistics = calculate_statistics(&spikes, simulation.simtime)?;
    for population in &statistics {
        info!(
            "{}: rate = {:.3} spikes/s, CV = {:.3}",
            population.population, population.rate, population.cv
        );
    }
    save_statistics(&statistics, statistics_file)
        .with_context(|| format!("cannot write {}", statistics_file.display()))?;
    info!("Statistics written to {}", statistics_file.display());
    Ok(())
}

fn plot_statistics_command(statistics_file: &Path, plot_file: &Path) -> Result<()> {
    let statistics = load_statistics(statistics_file)
        .with_context(|| format!("cannot load {}", statistics_file.display()))?;
    statistics_plot(plot_file, &statistics)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match &cli.command {
        Command::SimulateBrunel(args) => simulate_brunel_command(args, &cli.engine),
        Command::PlotPhaseDiagram(args) => plot_phase_diagram_command(args),
        Command::SimulateMultiarea(args) => simulate_multiarea_command(args, &cli.engine),
        Command::PlotConnectivity {
            synapse_file,
            plot_file,
        } => plot_connectivity_command(synapse_file, plot_file),
        Command::CalculateStatistics {
            spikes_file,
            simconfig_file,
            statistics_file,
        } => calculate_statistics_command(spikes_file, simconfig_file, statistics_file),
        Command::PlotStatistics {
            statistics_file,
            plot_file,
        } => plot_statistics_command(statistics_file, plot_file),
    }
}
