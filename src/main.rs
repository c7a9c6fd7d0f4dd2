mod cli;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use gdgkit::{
    client_config, init_logging, Config, DeviceClient, DeviceTiming, LogReceiver, MockDevice,
    BUILD_DATE, VERSION,
};

use crate::cli::{Cli, Command};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<ExitCode> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::debug!("gdgkit {} built {}", VERSION, BUILD_DATE);

    let config = load_config(&cli)?;

    if let Command::Hosts = cli.command {
        for (name, address) in &config.hosts {
            println!("{:<8} {}", name, address);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut client_cfg = client_config(&config, cli.debug);
    let (mut client, host) = if cli.simulate {
        client_cfg.timing = DeviceTiming::immediate();
        let device = MockDevice::new();
        let host = cli.host.clone().unwrap_or_else(|| "simulator".to_string());
        (DeviceClient::with_connector(client_cfg, device.connector()), host)
    } else {
        let Some(requested) = cli.host.as_deref() else {
            bail!("no device given; pass --host NAME|ADDR or --simulate");
        };
        let host = config.resolve_host(requested).to_string();
        (DeviceClient::new(client_cfg), host)
    };
    let port = cli.port.unwrap_or(config.connection.port);

    let receiver = client
        .take_log_receiver()
        .context("log receiver already taken")?;
    let stop = Arc::new(AtomicBool::new(false));
    let poller = spawn_poller(receiver, Arc::clone(&stop)).context("spawning log poller")?;

    let ok = client.connect(&host, port) && run_command(&mut client, &cli.command)?;
    client.disconnect();

    stop.store(true, Ordering::Release);
    if poller.join().is_err() {
        tracing::warn!("log poller panicked");
    }

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("loading config {}", path.display())),
            Err(e) => {
                tracing::debug!("{}, using default config", e);
                Ok(Config::default())
            }
        },
    }
}

fn run_command(client: &mut DeviceClient, command: &Command) -> anyhow::Result<bool> {
    let ok = match command {
        Command::Read => {
            let snapshot = client.read_settings();
            if !snapshot.is_empty() {
                println!("{}", snapshot);
            }
            !snapshot.is_empty()
        }
        Command::Set {
            channel,
            kind,
            value,
        } => client.set_adjustment(channel, (*kind).into(), value),
        Command::Trigger { channel, mode } => client.set_trigger_mode(channel, mode),
        Command::Output { channel, control } => client.set_output_control(channel, control),
        Command::Autorun {
            channel,
            step,
            duration,
        } => {
            let duration = Duration::try_from_secs_f64(*duration)
                .with_context(|| format!("invalid autorun duration: {}", duration))?;
            let summary = client.autorun(channel, *step, duration);
            if let Some(last) = summary.last_value {
                println!("{} steps applied, last delay {:.1} us", summary.steps_applied, last);
            }
            summary.steps_applied > 0
        }
        Command::Hosts => true,
    };
    Ok(ok)
}

/// Print operator log events until `stop` is set and the queue is empty.
fn spawn_poller(mut receiver: LogReceiver, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("log-poller".to_string())
        .spawn(move || loop {
            let stopping = stop.load(Ordering::Acquire);
            for event in receiver.drain() {
                eprintln!("{}", event);
            }
            if stopping {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        })
}
