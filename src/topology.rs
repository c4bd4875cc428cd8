//! Virtual fleet model.
//!
//! Built exactly once per generation run from the request's environment
//! profile and device count: datacenters → rooms → racks → devices →
//! interfaces → optical modules. The structure is immutable afterwards
//! and is the only state shared between table workers, so generation
//! needs no locks.
//!
//! The composite key (`module_id`) for every optically-populated
//! interface is precomputed here, which is what guarantees that all five
//! schema synthesizers see byte-identical identity blocks.

use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::GenerationRequest;
use crate::error::SimError;
use crate::stream_seed;

pub const DEVICE_VENDORS: &[&str] = &[
    "Cisco",
    "Huawei",
    "Juniper",
    "Arista",
    "Dell",
    "Broadcom Sonic",
    "Community Sonic",
];

pub const OPTICAL_VENDORS: &[&str] = &[
    "Innolight",
    "Luxshare",
    "Finisar",
    "HGTECH",
    "Eoptolink",
    "Accelink",
];

pub const SPEEDS: &[&str] = &["1G", "10G", "25G", "100G", "200G", "400G", "800G"];

const DATACENTERS: &[&str] = &["DC1", "DC2", "DC3"];
const ROOMS: &[&str] = &["Pod01", "Pod02", "Pod03", "Pod04"];
const RACKS: &[&str] = &["Rack01", "Rack02", "Rack03", "Rack04", "Rack05"];
const FORM_FACTORS: &[&str] = &["SR", "LR", "PSM4", "CWDM4", "LR4", "SR4", "AOC", "DAC"];
const MTUS: &[u32] = &[1500, 9000, 9216];

/// Interface capacity in bits per second for a speed class.
pub fn speed_bps(speed: &str) -> u64 {
    match speed {
        "1G" => 1_000_000_000,
        "10G" => 10_000_000_000,
        "25G" => 25_000_000_000,
        "100G" => 100_000_000_000,
        "200G" => 200_000_000_000,
        "400G" => 400_000_000_000,
        "800G" => 800_000_000_000,
        _ => 10_000_000_000,
    }
}

/// Nominal operating point of one optical module, used as the anchor
/// for every DDM-style reading synthesized against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalBaseline {
    pub temperature_c: f64,
    pub voltage_v: f64,
    pub bias_ma: f64,
    pub tx_power_dbm: f64,
    pub rx_power_dbm: f64,
}

impl OpticalBaseline {
    fn sample(rng: &mut ChaCha8Rng) -> Self {
        Self {
            temperature_c: rng.random_range(35.0..60.0),
            voltage_v: rng.random_range(3.25..3.55),
            bias_ma: rng.random_range(15.0..70.0),
            tx_power_dbm: rng.random_range(-1.5..1.5),
            rx_power_dbm: rng.random_range(-3.5..0.5),
        }
    }
}

/// Pluggable optical module seated in one interface.
#[derive(Debug, Clone)]
pub struct Module {
    pub vendor: &'static str,
    pub serial: String,
    pub part: String,
    pub baseline: OpticalBaseline,
}

/// One switch port. Immutable for the run.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub if_index: u32,
    pub speed: &'static str,
    pub mtu: u32,
    pub module: Option<Module>,
}

/// One network device with its placement and ports.
#[derive(Debug, Clone)]
pub struct Device {
    pub hostname: String,
    pub ip: String,
    pub vendor: &'static str,
    pub datacenter: &'static str,
    pub room: &'static str,
    pub rack: &'static str,
    pub interfaces: Vec<Interface>,
}

/// Index of one composite key in the topology's flat key table.
pub type KeyId = usize;

/// Precomputed identity block for one keyed interface/module. Everything
/// a synthesizer needs to fill the common field block, resolved once at
/// build time.
#[derive(Debug, Clone)]
pub struct ModuleKey {
    pub module_id: String,
    pub datacenter: &'static str,
    pub room: &'static str,
    pub rack: &'static str,
    pub hostname: String,
    pub ip: String,
    pub device_vendor: &'static str,
    pub interface: String,
    pub speed: &'static str,
    pub if_index: u32,
    pub mtu: u32,
    pub baseline: OpticalBaseline,
}

/// The immutable virtual fleet for one run.
#[derive(Debug, Clone)]
pub struct Topology {
    devices: Vec<Device>,
    keys: Vec<ModuleKey>,
}

impl Topology {
    /// Builds the fleet. Deterministic for a given request and seed; the
    /// topology stream is independent of the per-table value streams so
    /// adding tables never reshuffles the fleet.
    pub fn build(request: &GenerationRequest, seed: u64) -> Result<Topology, SimError> {
        request.validate()?;

        let shape = request.environment.shape();
        let mut rng = ChaCha8Rng::seed_from_u64(stream_seed(seed, "topology"));
        let vendor_weights: Vec<f64> = DEVICE_VENDORS
            .iter()
            .map(|v| {
                if shape.primary_vendors.contains(v) {
                    0.7
                } else {
                    0.3
                }
            })
            .collect();
        let vendor_pick = WeightedIndex::new(&vendor_weights)
            .map_err(|e| SimError::configuration("environment", e.to_string()))?;

        let mut devices = Vec::with_capacity(request.devices());
        for index in 0..request.devices() {
            let prefix = shape.prefixes[index % shape.prefixes.len()];
            let hostname = format!(
                "{}-{}-{}",
                prefix,
                rng.random_range(1..=100),
                rng.random_range(1..=10)
            );
            let vendor = DEVICE_VENDORS[vendor_pick.sample(&mut rng)];
            let datacenter = *DATACENTERS.choose(&mut rng).unwrap_or(&DATACENTERS[0]);
            let room = *ROOMS.choose(&mut rng).unwrap_or(&ROOMS[0]);
            let rack = *RACKS.choose(&mut rng).unwrap_or(&RACKS[0]);

            let ports = rng.random_range(shape.port_density.0..=shape.port_density.1);
            let mut interfaces = Vec::with_capacity(ports);
            for port in 1..=ports {
                interfaces.push(build_interface(&mut rng, port as u32));
            }

            devices.push(Device {
                hostname,
                ip: ip_of(shape.network, index as u32),
                vendor,
                datacenter,
                room,
                rack,
                interfaces,
            });
        }

        let keys = derive_keys(&devices);
        Ok(Topology { devices, keys })
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn keys(&self) -> &[ModuleKey] {
        &self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn key(&self, id: KeyId) -> &ModuleKey {
        &self.keys[id]
    }

    pub fn contains_module_id(&self, module_id: &str) -> bool {
        self.keys.iter().any(|k| k.module_id == module_id)
    }
}

fn build_interface(rng: &mut ChaCha8Rng, port: u32) -> Interface {
    // The first port always carries pluggable optics so every device is
    // guaranteed to contribute at least one composite key; 1G ports
    // otherwise never take a pluggable module.
    let speed = if port == 1 {
        SPEEDS[rng.random_range(1..SPEEDS.len())]
    } else {
        SPEEDS[rng.random_range(0..SPEEDS.len())]
    };
    let populated = port == 1 || (speed != "1G" && rng.random_bool(0.7));

    let module = populated.then(|| {
        let vendor = OPTICAL_VENDORS[rng.random_range(0..OPTICAL_VENDORS.len())];
        let form = FORM_FACTORS[rng.random_range(0..FORM_FACTORS.len())];
        Module {
            vendor,
            serial: serial_number(rng),
            part: format!("{}-{}-{}", vendor, speed, form),
            baseline: OpticalBaseline::sample(rng),
        }
    });

    Interface {
        name: format!("Ethernet{}/{}", rng.random_range(1..=8), port),
        if_index: port,
        speed,
        mtu: MTUS[rng.random_range(0..MTUS.len())],
        module,
    }
}

fn derive_keys(devices: &[Device]) -> Vec<ModuleKey> {
    let mut keys = Vec::new();
    for device in devices {
        for interface in &device.interfaces {
            let Some(module) = &interface.module else {
                continue;
            };
            keys.push(ModuleKey {
                module_id: format!(
                    "{}-{}-{}-{}-{}-{}-{}",
                    module.vendor,
                    device.datacenter,
                    device.room,
                    device.rack,
                    device.hostname,
                    interface.name,
                    interface.speed
                ),
                datacenter: device.datacenter,
                room: device.room,
                rack: device.rack,
                hostname: device.hostname.clone(),
                ip: device.ip.clone(),
                device_vendor: device.vendor,
                interface: interface.name.clone(),
                speed: interface.speed,
                if_index: interface.if_index,
                mtu: interface.mtu,
                baseline: module.baseline,
            });
        }
    }
    keys
}

fn serial_number(rng: &mut ChaCha8Rng) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..8)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

fn ip_of(network: u32, index: u32) -> String {
    let host = network + 1 + index;
    format!(
        "{}.{}.{}.{}",
        host >> 24,
        (host >> 16) & 0xff,
        (host >> 8) & 0xff,
        host & 0xff
    )
}
