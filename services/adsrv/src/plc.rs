//! PLC access
//!
//! Type model, little-endian codec, the [`PlcConnection`] abstraction and its
//! two backends: ADS over TCP and an in-memory virtual PLC.

pub mod ads_client;
pub mod codec;
pub mod connection;
pub mod types;
pub mod virt;

use std::sync::Arc;
use tracing::info;

pub use ads_client::{AdsClientConfig, TcpAdsConnection, AMS_TCP_PORT};
pub use connection::{PlcConnection, PlcState, PlcSymbol, SymbolInfo};
pub use types::{PlcType, PlcValue};
pub use virt::VirtualPlc;

use crate::config::{DeviceProperties, PlcProtocol, VirtualSymbolConfig};
use crate::error::{AdsError, Result};

/// Create the connection selected by `props.protocol`
pub fn create_connection(props: &DeviceProperties) -> Result<Arc<dyn PlcConnection>> {
    match props.protocol {
        PlcProtocol::Ads => {
            let config = AdsClientConfig {
                host: props.router_host()?,
                ams_netid: props.netid()?,
                ams_port: props.ams_port,
                timeout: props.timeout(),
            };
            info!(
                "Using ADS connection {} via {}:{}",
                props.endpoint(),
                config.host,
                AMS_TCP_PORT
            );
            Ok(Arc::new(TcpAdsConnection::new(config)))
        },
        PlcProtocol::Virtual => {
            let plc = VirtualPlc::new(props.endpoint());
            for symbol in &props.virtual_symbols {
                declare_virtual_symbol(&plc, symbol)?;
            }
            info!(
                "Using virtual PLC {} with {} symbol(s)",
                props.endpoint(),
                props.virtual_symbols.len()
            );
            Ok(Arc::new(plc))
        },
    }
}

fn declare_virtual_symbol(plc: &VirtualPlc, symbol: &VirtualSymbolConfig) -> Result<()> {
    plc.add_symbol(&symbol.name, &symbol.plc_type)?;
    match &symbol.value {
        None => Ok(()),
        Some(serde_json::Value::Array(items)) => {
            let values = items
                .iter()
                .map(|v| json_to_plc(&symbol.name, v))
                .collect::<Result<Vec<_>>>()?;
            plc.poke_elements(&symbol.name, &values)
        },
        Some(v) => plc.poke(&symbol.name, &json_to_plc(&symbol.name, v)?),
    }
}

fn json_to_plc(name: &str, value: &serde_json::Value) -> Result<PlcValue> {
    serde_json::from_value(value.clone())
        .map_err(|e| AdsError::config(format!("initial value of {}: {}", name, e)))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde_json::json;

    fn virtual_props(symbols: Vec<VirtualSymbolConfig>) -> DeviceProperties {
        DeviceProperties {
            protocol: PlcProtocol::Virtual,
            virtual_symbols: symbols,
            ..Default::default()
        }
    }

    #[test]
    fn test_virtual_connection_with_initial_values() {
        let props = virtual_props(vec![
            VirtualSymbolConfig {
                name: "MAIN.fTemp".into(),
                plc_type: "LREAL".into(),
                value: Some(json!(21.5)),
            },
            VirtualSymbolConfig {
                name: "MAIN.array1".into(),
                plc_type: "ARRAY [0..3] OF REAL".into(),
                value: Some(json!([1.0, 2.0])),
            },
        ]);
        let conn = create_connection(&props).unwrap();
        conn.open().unwrap();

        let temp = PlcSymbol::resolve(conn.clone(), "MAIN.fTemp").unwrap();
        assert_eq!(temp.read().unwrap(), PlcValue::Real(21.5));

        let mut buf = [0u8; 16];
        conn.read_by_name("MAIN.array1", &mut buf).unwrap();
        assert_eq!(codec::decode_reals(&buf), vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_virtual_bad_initial_value() {
        let props = virtual_props(vec![VirtualSymbolConfig {
            name: "MAIN.n".into(),
            plc_type: "SINT".into(),
            value: Some(json!(1000)),
        }]);
        assert!(create_connection(&props).is_err());
    }

    #[test]
    fn test_ads_connection_starts_closed() {
        let props = DeviceProperties {
            ams_netid: "192.168.1.20.1.1".into(),
            ..Default::default()
        };
        let conn = create_connection(&props).unwrap();
        assert!(!conn.is_open());
        assert_eq!(conn.endpoint(), "192.168.1.20.1.1:851");
    }
}
