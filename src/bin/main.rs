use std::{io, process, thread, time::Duration};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use daemong::{
    cli::{Cli, Commands, parse_args},
    config::load_config,
    daemon::{Daemon, Service},
    signals,
};

/// Sample workload: parks the daemon in a sleep loop until a termination
/// signal arrives.
struct IdleService;

impl Service for IdleService {
    fn run(&mut self) {
        info!("Idle service running");
        loop {
            thread::sleep(Duration::from_secs(1));
        }
    }
}

fn main() {
    let args = parse_args();
    init_logging(&args);

    if let Err(err) = run(args) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(Some(args.command.config()))?;
    let mut daemon = Daemon::new(config, IdleService);

    match args.command {
        Commands::Start { .. } => {
            register_termination_handler()?;
            info!("Starting daemon (pidfile {:?})", daemon.config().pid_file);
            daemon.start()?;
        }
        Commands::Stop { .. } => {
            let attempts = daemon.stop()?;
            info!("Stop finished after {attempts} termination attempts");
        }
        Commands::Restart { .. } => {
            register_termination_handler()?;
            daemon.restart()?;
        }
    }

    Ok(())
}

/// Installs the SIGTERM handler ahead of detachment. Exiting through the
/// normal path lets the pidfile's exit-time cleanup run.
fn register_termination_handler() -> io::Result<()> {
    signals::register(libc::SIGTERM, |_signal| {
        process::exit(0);
    })?;
    Ok(())
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
