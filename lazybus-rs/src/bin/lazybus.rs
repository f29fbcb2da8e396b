//! CLI for lazybus-rs: check subscriber descriptors and show the call order they produce.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use lazybus_rs::{ContainerAwareDispatcher, DispatchError, Dispatcher, Error, Event, Service, SubscribedEvents};
use tracing_subscriber::EnvFilter;

const DESCRIPTOR: &str = "descriptor";

#[derive(Parser)]
#[command(name = "lazybus")]
#[command(about = "lazybus subscriber descriptor tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a descriptor to a recording service and print the call order of each event.
    Plan {
        /// JSON map of event name to method, [method, priority] or list of those
        file: PathBuf,
        /// Service key the descriptor is bound to
        #[arg(long, default_value = "subscriber")]
        service: String,
        /// Only dispatch these events (default: every declared event)
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Validate a descriptor and print how many bindings it declares.
    Check {
        file: PathBuf,
    },
}

/// Accepts every method name and remembers the order of calls.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Service for Recorder {
    fn call(&self, method: &str, _event: &mut Event) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(method.to_owned());
        Ok(())
    }
}

fn load(path: &Path) -> Result<SubscribedEvents, Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    parse(&text)
}

fn parse(text: &str) -> Result<SubscribedEvents, Error> {
    Ok(serde_json::from_str(text)?)
}

fn bound(service: &str, events: SubscribedEvents) -> Result<ContainerAwareDispatcher, Error> {
    let mut d: ContainerAwareDispatcher = ContainerAwareDispatcher::default();
    d.subscriber_types_mut().register_descriptor(DESCRIPTOR, events);
    d.add_subscriber_service_named(service, DESCRIPTOR)?;
    Ok(d)
}

/// One line per observed call, `event: priority service:method`, in dispatch order.
fn plan_lines(events: SubscribedEvents, service: &str, selected: Vec<String>) -> Result<Vec<String>, Error> {
    let names: Vec<String> = if selected.is_empty() {
        events.events().map(str::to_owned).collect()
    } else {
        selected
    };
    let d = bound(service, events)?;

    // Registered after binding: nothing is resolved until the first dispatch.
    d.container()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .register_factory_with_key(service, |_| Recorder::default());

    let mut lines = Vec::new();
    for name in names {
        d.dispatch(&name, Event::default())?;
        let calls = d
            .container()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .resolve_by_key::<Recorder>(service)
            .map_err(DispatchError::from)?
            .take();
        if calls.is_empty() {
            lines.push(format!("{name}: no listeners"));
            continue;
        }
        let mut pending = d.service_listeners(&name);
        pending.sort_by(|a, b| b.1.cmp(&a.1));
        for method in calls {
            let priority = match pending.iter().position(|(r, _)| r.method() == method) {
                Some(pos) => pending.remove(pos).1.to_string(),
                None => "?".to_owned(),
            };
            lines.push(format!("{name}: {priority} {service}:{method}"));
        }
    }
    Ok(lines)
}

fn check_line(label: &str, events: SubscribedEvents) -> Result<String, Error> {
    let bindings = events.bindings().len();
    let declared = events.events().count();
    bound(DESCRIPTOR, events)?;
    Ok(format!("{label}: {bindings} bindings across {declared} events"))
}

fn run(command: Commands) -> Result<Vec<String>, Error> {
    match command {
        Commands::Plan {
            file,
            service,
            events,
        } => plan_lines(load(&file)?, &service, events),
        Commands::Check { file } => {
            let events = load(&file)?;
            Ok(vec![check_line(&file.display().to_string(), events)?])
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
