// Route20: a DECnet Phase IV routing engine
// Copyright (C) 2021  Route20 contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Configuration (A1): a read-only TOML file parsed at startup and on a
//! coarse file-change poll, per §6.

use std::collections::HashMap;

use serde::Deserialize;

use crate::address::Address;
use crate::error::ConfigError;

/// The node's own routing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingLevel {
    /// Intra-area only.
    Level1,
    /// Intra- and inter-area.
    Level2,
}

/// `[node]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Area number, `1..=63`.
    pub area: u8,
    /// Node number, `1..=1023`.
    pub node: u16,
    /// Routing level.
    pub level: RoutingLevel,
    /// Designated-router election priority, `0..=127`.
    pub priority: u8,
    /// Human-readable node name (`<=Maxl` characters).
    pub name: String,
}

impl NodeConfig {
    /// The node's full address, if `area`/`node` are in range.
    pub fn address(&self) -> Option<Address> {
        Address::new(self.area, self.node)
    }
}

/// Kind-specific parameters for one configured circuit, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind")]
pub enum CircuitConfigKind {
    /// Raw Ethernet via libpcap.
    #[serde(rename = "ethernet_pcap")]
    EthernetPcap {
        /// Host interface name (e.g. `eth0`).
        interface: String,
    },
    /// Ethernet framing carried over UDP, for testing without raw sockets.
    #[serde(rename = "ethernet_socket")]
    EthernetSocket {
        /// Local UDP port to receive on.
        receive_port: u16,
        /// Peer host to send to.
        destination_host: String,
        /// Peer UDP port to send to.
        destination_port: u16,
    },
    /// DDCMP carried over a TCP stream.
    #[serde(rename = "ddcmp_socket")]
    DdcmpSocket {
        /// Peer host to connect to.
        destination_host: String,
        /// Peer TCP port to connect to.
        destination_port: u16,
    },
}

/// `[[circuit]]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CircuitConfig {
    /// Circuit name, unique among all configured circuits.
    pub name: String,
    /// Configured cost, `1..=Maxc`; 0 is rejected at load.
    pub cost: u16,
    /// Kind and kind-specific parameters.
    #[serde(flatten)]
    pub kind: CircuitConfigKind,
}

/// `[logging]`: per-category level names, interpreted by the `log` facade's
/// initializer (A3).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct LoggingConfig {
    /// Category name (e.g. `"circuit"`, `"routing"`) to level name
    /// (`"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`).
    #[serde(default)]
    pub levels: HashMap<String, String>,
}

/// The full configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// `[node]`.
    pub node: NodeConfig,
    /// `[[circuit]]`, repeated.
    #[serde(default, rename = "circuit")]
    pub circuits: Vec<CircuitConfig>,
    /// `[logging]`.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate a configuration from its TOML text. A
    /// [`ConfigError`] here is fatal at startup; on a subsequent
    /// file-change poll the caller should log it as a warning and keep the
    /// previously loaded configuration (§7).
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node.address().is_none() {
            return Err(ConfigError::Invalid(format!(
                "node address {}.{} is out of range",
                self.node.area, self.node.node
            )));
        }
        if self.node.name.len() > crate::constants::MAXL {
            return Err(ConfigError::NodeNameTooLong(
                self.node.name.clone(),
                crate::constants::MAXL,
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for circuit in &self.circuits {
            if circuit.cost == 0 {
                return Err(ConfigError::InvalidCircuitCost(
                    circuit.name.clone(),
                    0,
                ));
            }
            if circuit.cost as i64 > crate::constants::MAXC as i64 {
                return Err(ConfigError::InvalidCircuitCost(
                    circuit.name.clone(),
                    circuit.cost as i64,
                ));
            }
            if !seen.insert(&circuit.name) {
                return Err(ConfigError::DuplicateCircuitName(circuit.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"
        [node]
        area = 1
        node = 10
        level = "level1"
        priority = 64
        name = "ALPHA"

        [[circuit]]
        name = "eth-0"
        kind = "ethernet_pcap"
        cost = 4
        interface = "eth0"

        [[circuit]]
        name = "ddcmp-0"
        kind = "ddcmp_socket"
        cost = 3
        destination_host = "10.0.0.2"
        destination_port = 700

        [logging]
        levels = { circuit = "info", routing = "debug" }
    "#;

    #[test]
    fn parses_sample_config() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.node.address(), Address::new(1, 10));
        assert_eq!(config.circuits.len(), 2);
        assert_eq!(config.logging.levels.get("routing").unwrap(), "debug");
    }

    #[test]
    fn rejects_zero_cost() {
        let bad = SAMPLE.replace("cost = 4", "cost = 0");
        assert!(matches!(
            Config::parse(&bad),
            Err(ConfigError::InvalidCircuitCost(_, 0))
        ));
    }

    #[test]
    fn rejects_duplicate_circuit_names() {
        let bad = SAMPLE.replace("ddcmp-0", "eth-0");
        assert!(matches!(
            Config::parse(&bad),
            Err(ConfigError::DuplicateCircuitName(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_node_address() {
        let bad = SAMPLE.replace("node = 10", "node = 9999");
        assert!(matches!(Config::parse(&bad), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_overlong_node_name() {
        let bad = SAMPLE.replace("name = \"ALPHA\"", "name = \"ABCDEFGHIJKLMNOPQRSTUVWXYZ\"");
        assert!(matches!(
            Config::parse(&bad),
            Err(ConfigError::NodeNameTooLong(_, 25))
        ));
    }
}
