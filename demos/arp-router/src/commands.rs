use std::net::Ipv4Addr;
use std::str::FromStr;

/// One line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `rx <iface> <hex frame>`: a frame arrived on an interface.
    Rx { interface: String, frame: Vec<u8> },
    /// `tx <iface> <next-hop> <hex frame>`: route a frame out of an interface.
    Tx {
        interface: String,
        next_hop: Ipv4Addr,
        frame: Vec<u8>,
    },
    /// `cache`: dump the ARP cache.
    Cache,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["rx", interface, frame] => Ok(Command::Rx {
                interface: interface.to_string(),
                frame: decode_hex(frame)?,
            }),
            ["tx", interface, next_hop, frame] => Ok(Command::Tx {
                interface: interface.to_string(),
                next_hop: next_hop
                    .parse()
                    .map_err(|_| format!("{:?} is not an IPv4 address", next_hop))?,
                frame: decode_hex(frame)?,
            }),
            ["cache"] => Ok(Command::Cache),
            _ => Err(format!(
                "unrecognized command {:?}, expected rx, tx or cache",
                line
            )),
        }
    }
}

pub fn decode_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex frame has an odd number of digits".to_string());
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            Some(pair)
                .filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| format!("{:?} is not hex", String::from_utf8_lossy(pair)))
        })
        .collect()
}

pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
