mod cli;
mod commands;
mod subscriber;

use crate::commands::{encode_hex, Command};
use crate::subscriber::StderrSubscriber;
use crossbeam::crossbeam_channel;
use route_rs_packets::EthernetFrame;
use route_rs_runtime::interface::{ChannelTransmit, InterfaceAnnotated, StaticInterfaceTable};
use route_rs_runtime::processor::{ArpHandler, Processor};
use route_rs_runtime::telemetry::{ArpCounters, Tee, TracingTelemetry};
use route_rs_runtime::utils::run_maintenance;
use route_rs_runtime::ArpDispatcher;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tokio::runtime;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

type Telemetry = Tee<TracingTelemetry, Arc<ArpCounters>>;
type Dispatcher = ArpDispatcher<ChannelTransmit, StaticInterfaceTable, Telemetry>;
type Handler = ArpHandler<ChannelTransmit, StaticInterfaceTable, Telemetry>;

fn main() {
    let matches = cli::app().get_matches();
    let options = cli::options(&matches).unwrap_or_else(|err| {
        eprintln!("error: {}", err);
        std::process::exit(2);
    });

    let subscriber = StderrSubscriber::with_verbosity(options.verbosity);
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let (sender, receiver) = crossbeam_channel::unbounded();
    let counters = Arc::new(ArpCounters::new());
    let tick = options.config.tick_interval;
    let dispatcher: Arc<Dispatcher> = Arc::new(
        ArpDispatcher::new(
            StaticInterfaceTable::new(options.interfaces),
            ChannelTransmit::new(sender),
            options.config,
        )
        .telemetry(Tee(TracingTelemetry, counters.clone())),
    );

    // Everything the dispatcher transmits goes to stdout as `<iface> <hex>`.
    let printer = thread::spawn(move || {
        let stdout = io::stdout();
        for outbound in receiver.iter() {
            let mut out = stdout.lock();
            if writeln!(out, "{} {}", outbound.interface, encode_hex(&outbound.frame)).is_err() {
                break;
            }
            let _ = out.flush();
        }
    });

    let mut rt = runtime::Builder::new()
        .threaded_scheduler()
        .enable_all()
        .build()
        .expect("failed to start tokio runtime");

    rt.block_on(async {
        let (stop, shutdown) = oneshot::channel();
        let maintenance = tokio::spawn(run_maintenance(dispatcher.clone(), tick, shutdown));

        let reader = dispatcher.clone();
        match tokio::task::spawn_blocking(move || read_commands(&reader)).await {
            Ok(Err(err)) => warn!(error = %err, "failed to read stdin"),
            Err(err) => warn!(error = %err, "command reader panicked"),
            Ok(Ok(())) => {}
        }

        let _ = stop.send(());
        if let Ok(passes) = maintenance.await {
            debug!(passes, "maintenance finished");
        }
    });

    // The printer exits once the last transmit handle is gone.
    drop(dispatcher);
    let _ = printer.join();

    info!(counters = ?counters.snapshot(), "done");
}

fn read_commands(dispatcher: &Arc<Dispatcher>) -> io::Result<()> {
    let mut handler = ArpHandler::new(dispatcher.clone());
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse() {
            Ok(command) => run(command, dispatcher, &mut handler),
            Err(err) => warn!("{}", err),
        }
    }
    Ok(())
}

fn run(command: Command, dispatcher: &Dispatcher, handler: &mut Handler) {
    match command {
        Command::Rx { interface, frame } => match EthernetFrame::from_buffer(frame, 0) {
            Ok(frame) => {
                let dispatch = handler.process(InterfaceAnnotated::new(frame, &interface));
                debug!(interface = interface.as_str(), dispatch = ?dispatch, "received");
            }
            Err(err) => warn!(interface = interface.as_str(), error = %err, "dropping frame"),
        },
        Command::Tx {
            interface,
            next_hop,
            frame,
        } => {
            let frame = match EthernetFrame::from_buffer(frame, 0) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(interface = interface.as_str(), error = %err, "dropping frame");
                    return;
                }
            };
            match dispatcher.resolve_and_send(next_hop, frame, &interface, Instant::now()) {
                Ok(resolution) => debug!(next_hop = %next_hop, resolution = ?resolution, "routed"),
                Err(err) => warn!(next_hop = %next_hop, error = %err, "failed to route"),
            }
        }
        Command::Cache => print!("{}", dispatcher.cache_dump()),
    }
}
