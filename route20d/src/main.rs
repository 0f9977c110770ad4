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

//! `route20d`: the DECnet Phase IV routing daemon binary. Loads a TOML
//! configuration (A1/A6), wires up a [`RouterState`] with one circuit per
//! `[[circuit]]` entry backed by a concrete `route20_runtime::datalink`
//! backend, and runs the cooperative event loop (A5) until SIGTERM/SIGINT.
//!
//! CLI (§6): a single optional argument is the configuration file path;
//! absent, a default relative to the working directory is used. Exit 0 on
//! clean shutdown, non-zero on fatal init failure (§7, `ConfigError`).

use std::error::Error;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::Parser;

use route20_core::circuit::{Circuit, Datalink};
use route20_core::config::{CircuitConfigKind, Config, RoutingLevel};
use route20_core::node::RouterState;
use route20_runtime::datalink::{DdcmpSocketDatalink, EthernetPcapDatalink, EthernetSocketDatalink};
use route20_runtime::event_loop::{now_secs, EventLoop, LoggingNspSink};

const DEFAULT_CONFIG_FILE_NAME: &str = "route20.toml";

/// DECnet Phase IV routing engine.
#[derive(Parser, Debug)]
#[command(name = "route20d", author, version, about)]
struct CommandLineArguments {
    /// Path to the TOML configuration file. Defaults to `route20.toml` in
    /// the current working directory.
    config: Option<PathBuf>,
}

fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join(DEFAULT_CONFIG_FILE_NAME)
}

fn resolve_destination(host: &str, port: u16) -> Result<SocketAddr, Box<dyn Error>> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("could not resolve {}:{}", host, port).into())
}

fn build_circuit(
    slot: u16,
    cfg: &route20_core::config::CircuitConfig,
    local_address: route20_core::address::Address,
) -> Result<Circuit, Box<dyn Error>> {
    let datalink: Box<dyn Datalink> = match &cfg.kind {
        CircuitConfigKind::EthernetPcap { interface } => {
            Box::new(EthernetPcapDatalink::new(interface.clone(), local_address))
        }
        CircuitConfigKind::EthernetSocket {
            receive_port,
            destination_host,
            destination_port,
        } => {
            let destination = resolve_destination(destination_host, *destination_port)?;
            Box::new(EthernetSocketDatalink::new(*receive_port, destination))
        }
        CircuitConfigKind::DdcmpSocket {
            destination_host,
            destination_port,
        } => Box::new(DdcmpSocketDatalink::new(
            destination_host.clone(),
            *destination_port,
        )),
    };

    let circuit = match &cfg.kind {
        CircuitConfigKind::EthernetPcap { .. } | CircuitConfigKind::EthernetSocket { .. } => {
            Circuit::new_ethernet(slot, cfg.name.clone(), cfg.cost, local_address, datalink)?
        }
        CircuitConfigKind::DdcmpSocket { .. } => {
            Circuit::new_ddcmp(slot, cfg.name.clone(), cfg.cost, local_address, datalink)?
        }
    };
    Ok(circuit)
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config file {}: {}", path.display(), e))?;
    Ok(Config::parse(&text)?)
}

fn init_logging(config: &Config) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    for (category, level) in &config.logging.levels {
        match level.parse::<log::LevelFilter>() {
            Ok(level) => {
                builder.filter_module(category, level);
            }
            Err(_) => eprintln!("unrecognized logging level {:?} for category {}", level, category),
        }
    }
    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CommandLineArguments::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);

    let config = load_config(&config_path).map_err(|e| {
        eprintln!("fatal: {}", e);
        e
    })?;
    init_logging(&config);

    log::info!("loaded configuration from {}", config_path.display());

    let local_address = config.node.address().expect("validated at Config::parse");
    let is_level2 = config.node.level == RoutingLevel::Level2;

    let mut state = RouterState::new(local_address, is_level2, config.node.priority);
    let now = now_secs();

    for (i, circuit_cfg) in config.circuits.iter().enumerate() {
        let slot = (i + 1) as u16;
        if slot as usize > route20_core::constants::NC as usize {
            return Err(format!(
                "too many circuits configured: max {} (NC)",
                route20_core::constants::NC
            )
            .into());
        }
        let circuit = build_circuit(slot, circuit_cfg, local_address)?;
        state.add_circuit(circuit, now);
    }

    let startup_actions = state.start_all_circuits(now)?;

    let mut event_loop = EventLoop::new(state, LoggingNspSink::default())?;
    event_loop.dispatch(startup_actions);

    log::info!("node {} entering event loop", local_address);
    event_loop.run()?;

    log::info!("exited cleanly");
    Ok(())
}
