//! Shared fixtures for adsrv integration tests

#![allow(dead_code)]
#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use std::sync::Arc;

use adsrv::device::DeviceServer;
use adsrv::plc::{PlcValue, VirtualPlc};
use adsrv::{DeviceProperties, TwincatAds};

pub const ARRAY_LEN: usize = 200;

/// Virtual PLC with the symbols used across the tests
pub fn test_plc() -> Arc<VirtualPlc> {
    let plc = VirtualPlc::new("127.0.0.1.1.1:851")
        .with_value("MAIN.x", "BOOL", PlcValue::Bool(true))
        .unwrap()
        .with_value("MAIN.y", "LREAL", PlcValue::Real(0.0))
        .unwrap()
        .with_value("MAIN.counter", "DINT", PlcValue::Int(12))
        .unwrap()
        .with_value("MAIN.sName", "STRING(20)", PlcValue::from("cell-1"))
        .unwrap()
        .with_symbol("MAIN.array1", "ARRAY [0..199] OF REAL")
        .unwrap();

    let values: Vec<PlcValue> = (0..ARRAY_LEN).map(|i| PlcValue::Real(i as f64)).collect();
    plc.poke_elements("MAIN.array1", &values).unwrap();
    Arc::new(plc)
}

pub fn props(lines: &[&str]) -> DeviceProperties {
    DeviceProperties {
        scalar_symbols: lines.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Device server over `plc`, not started yet
pub fn server_with(plc: Arc<VirtualPlc>, lines: &[&str]) -> Arc<DeviceServer> {
    let device = Arc::new(TwincatAds::new(props(lines), plc));
    Arc::new(DeviceServer::new(device))
}

/// Started device server with the default fixture manifest
pub fn started_server() -> (Arc<DeviceServer>, Arc<VirtualPlc>) {
    let plc = test_plc();
    let server = server_with(
        plc.clone(),
        &[
            "MAIN.x, output, ro",
            "MAIN.y, setpoint, rw",
            "MAIN.counter, counter, rw",
            "MAIN.sName, cell, ro",
            "MAIN.array1, samples, ro",
        ],
    );
    server.start().unwrap();
    (server, plc)
}
