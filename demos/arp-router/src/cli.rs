use clap::{App, Arg, ArgMatches};
use route_rs_packets::MacAddr;
use route_rs_runtime::interface::Interface;
use route_rs_runtime::ArpConfig;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

pub struct Options {
    pub interfaces: Vec<Interface>,
    pub config: ArpConfig,
    pub verbosity: u64,
}

pub fn app() -> App<'static, 'static> {
    App::new("ARP Route-rs")
        .version("0.1")
        .author("Route-rs Contributors")
        .about("Resolve next hops for a route-rs router, reading frames as hex on stdin")
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("NAME,IP,MAC")
                .help("A router interface, e.g. eth0,10.0.0.1,02:00:00:00:00:01")
                .required(true)
                .multiple(true)
                .number_of_values(1)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cache-capacity")
                .long("cache-capacity")
                .value_name("ENTRIES")
                .help("Most mappings held at once")
                .default_value("100")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cache-ttl")
                .long("cache-ttl")
                .value_name("SECONDS")
                .help("How long a learned mapping is trusted")
                .default_value("15")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("retry-ms")
                .long("retry-ms")
                .value_name("MILLIS")
                .help("Time between requests for an unresolved address")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("max-attempts")
                .long("max-attempts")
                .value_name("COUNT")
                .help("Requests sent before an address is given up on")
                .default_value("5")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("queue-cap")
                .long("queue-cap")
                .value_name("PACKETS")
                .help("Packets held per unresolved address")
                .default_value("32")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("tick-ms")
                .long("tick-ms")
                .value_name("MILLIS")
                .help("Period of the maintenance loop")
                .default_value("1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for more detail"),
        )
}

pub fn options(matches: &ArgMatches) -> Result<Options, String> {
    let interfaces = matches
        .values_of("interface")
        .into_iter()
        .flatten()
        .map(parse_interface)
        .collect::<Result<Vec<_>, _>>()?;

    let config = ArpConfig::new()
        .cache_capacity(positive(matches, "cache-capacity")?)
        .cache_ttl(Duration::from_secs(number(matches, "cache-ttl")?))
        .retry_interval(Duration::from_millis(number(matches, "retry-ms")?))
        .max_attempts(positive(matches, "max-attempts")?)
        .queue_cap(positive(matches, "queue-cap")?)
        .tick_interval(Duration::from_millis(positive(matches, "tick-ms")?));

    Ok(Options {
        interfaces,
        config,
        verbosity: matches.occurrences_of("verbose"),
    })
}

/// Parses `NAME,IP,MAC`.
pub fn parse_interface(arg: &str) -> Result<Interface, String> {
    let fields: Vec<&str> = arg.split(',').map(str::trim).collect();
    match fields.as_slice() {
        [name, ip, mac] if !name.is_empty() => {
            let ip = Ipv4Addr::from_str(ip).map_err(|e| format!("{}: {}", arg, e))?;
            let mac = MacAddr::from_str(mac).map_err(|e| format!("{}: {}", arg, e))?;
            Ok(Interface::new(name, mac, ip))
        }
        _ => Err(format!("{}: expected NAME,IP,MAC", arg)),
    }
}

fn number<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, String> {
    let value = matches.value_of(name).unwrap_or_default();
    value
        .parse()
        .map_err(|_| format!("--{}: {:?} is not a number", name, value))
}

fn positive<T: FromStr + Default + PartialEq>(matches: &ArgMatches, name: &str) -> Result<T, String> {
    let value = number(matches, name)?;
    if value == T::default() {
        return Err(format!("--{} must be greater than zero", name));
    }
    Ok(value)
}
