//! ADS over TCP
//!
//! Wraps `ads::Client`. The client owns the socket and a reader thread, so it
//! is kept behind a mutex and a `Device` view is created per call.

use ads::index;
use ads::symbol::Handle;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AdsError, ErrorExt, Result};
use crate::plc::connection::{PlcConnection, PlcState, SymbolInfo};
use crate::plc::types::PlcType;

/// TCP port of the AMS router
pub const AMS_TCP_PORT: u16 = 48898;

/// Fixed part of an `AdsSymbolEntry`
const SYMBOL_ENTRY_HEADER: usize = 30;
const SYMBOL_ENTRY_MAX: usize = 0xFFFF;

/// Connection parameters for [`TcpAdsConnection`]
#[derive(Debug, Clone)]
pub struct AdsClientConfig {
    /// Host running the AMS router
    pub host: String,
    pub ams_netid: [u8; 6],
    pub ams_port: u16,
    pub timeout: Duration,
}

/// PLC connection through the `ads` crate
pub struct TcpAdsConnection {
    config: AdsClientConfig,
    client: Mutex<Option<ads::Client>>,
}

impl TcpAdsConnection {
    pub fn new(config: AdsClientConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    fn target(&self) -> ads::AmsAddr {
        let [a, b, c, d, e, f] = self.config.ams_netid;
        ads::AmsAddr::new(ads::AmsNetId::new(a, b, c, d, e, f), self.config.ams_port)
    }

    /// Run `op` against the target device while holding the client lock
    fn with_device<T>(
        &self,
        what: &str,
        op: impl FnOnce(ads::Device<'_>) -> ads::Result<T>,
    ) -> Result<T> {
        let guard = self.client.lock();
        let client = guard.as_ref().ok_or_else(AdsError::not_connected)?;
        op(client.device(self.target())).protocol_error(what)
    }
}

impl PlcConnection for TcpAdsConnection {
    fn endpoint(&self) -> String {
        format!("{}:{}", format_netid(&self.config.ams_netid), self.config.ams_port)
    }

    fn open(&self) -> Result<()> {
        let mut guard = self.client.lock();
        if guard.is_some() {
            debug!("ADS connection to {} already open", self.endpoint());
            return Ok(());
        }

        let client = ads::Client::new(
            (self.config.host.as_str(), AMS_TCP_PORT),
            ads::Timeouts::new(self.config.timeout),
            ads::Source::Auto,
        )
        .connection_error(&format!(
            "open {} via {}:{}",
            self.endpoint(),
            self.config.host,
            AMS_TCP_PORT
        ))?;

        *guard = Some(client);
        info!("ADS connection opened: {}", self.endpoint());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        // Dropping the client shuts the socket down and joins the reader thread
        if self.client.lock().take().is_some() {
            info!("ADS connection closed: {}", self.endpoint());
        } else {
            warn!("ADS connection to {} was not open", self.endpoint());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.client.lock().is_some()
    }

    fn read_state(&self) -> Result<PlcState> {
        let (ads_state, device_state) = self.with_device("read state", |dev| dev.get_state())?;
        Ok(PlcState {
            ads_state: format!("{:?}", ads_state),
            device_state,
        })
    }

    fn get_symbol(&self, name: &str) -> Result<SymbolInfo> {
        let mut buf = vec![0u8; SYMBOL_ENTRY_MAX];
        let mut request = name.as_bytes().to_vec();
        request.push(0);

        let len = self
            .with_device(&format!("symbol info {name}"), |dev| {
                dev.write_read(index::GET_SYMINFO_BYNAME_EX, 0, &request, &mut buf)
            })
            .map_err(|e| match e {
                AdsError::ProtocolError(msg) => AdsError::SymbolError(msg),
                other => other,
            })?;

        parse_symbol_entry(&buf[..len.min(buf.len())])
    }

    fn read_raw(&self, symbol: &SymbolInfo, buf: &mut [u8]) -> Result<()> {
        self.with_device(&format!("read {}", symbol.name), |dev| {
            dev.read_exact(symbol.index_group, symbol.index_offset, buf)
        })
    }

    fn write_raw(&self, symbol: &SymbolInfo, data: &[u8]) -> Result<()> {
        self.with_device(&format!("write {}", symbol.name), |dev| {
            dev.write(symbol.index_group, symbol.index_offset, data)
        })
    }

    fn read_by_name(&self, name: &str, buf: &mut [u8]) -> Result<()> {
        // The handle is released when it goes out of scope
        self.with_device(&format!("read {name} by name"), |dev| {
            Handle::new(dev, name)?.read(buf)
        })
    }
}

fn format_netid(netid: &[u8; 6]) -> String {
    netid
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16> {
    buf.get(at..at + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| AdsError::protocol("truncated symbol entry"))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    buf.get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| AdsError::protocol("truncated symbol entry"))
}

fn read_str(buf: &[u8], at: usize, len: usize) -> Result<String> {
    buf.get(at..at + len)
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .ok_or_else(|| AdsError::protocol("truncated symbol entry"))
}

/// Parse an `AdsSymbolEntry` as returned by `GET_SYMINFO_BYNAME_EX`
///
/// Layout: entry length, index group, index offset, size, data type, flags
/// (u32 each), then name/type/comment lengths (u16 each), followed by the
/// NUL-terminated name, type and comment strings.
pub fn parse_symbol_entry(buf: &[u8]) -> Result<SymbolInfo> {
    if buf.len() < SYMBOL_ENTRY_HEADER {
        return Err(AdsError::protocol(format!(
            "symbol entry too short: {} bytes",
            buf.len()
        )));
    }

    let index_group = read_u32(buf, 4)?;
    let index_offset = read_u32(buf, 8)?;
    let size = read_u32(buf, 12)? as usize;
    let name_len = read_u16(buf, 24)? as usize;
    let type_len = read_u16(buf, 26)? as usize;

    let name = read_str(buf, SYMBOL_ENTRY_HEADER, name_len)?;
    let type_name = read_str(buf, SYMBOL_ENTRY_HEADER + name_len + 1, type_len)?;
    let plc_type = PlcType::parse(&type_name)?;

    Ok(SymbolInfo {
        name,
        index_group,
        index_offset,
        size,
        type_name,
        plc_type,
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn entry(name: &str, ty: &str, ig: u32, io: u32, size: u32) -> Vec<u8> {
        let comment = "";
        let mut buf = Vec::new();
        let total = SYMBOL_ENTRY_HEADER + name.len() + ty.len() + comment.len() + 3;
        buf.extend_from_slice(&(total as u32).to_le_bytes());
        buf.extend_from_slice(&ig.to_le_bytes());
        buf.extend_from_slice(&io.to_le_bytes());
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes()); // ADST_REAL32
        buf.extend_from_slice(&8u32.to_le_bytes()); // flags
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(ty.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(ty.as_bytes());
        buf.push(0);
        buf.extend_from_slice(comment.as_bytes());
        buf.push(0);
        buf
    }

    #[test]
    fn test_parse_scalar_symbol_entry() {
        let buf = entry("MAIN.fSetpoint", "LREAL", 0x4020, 0x10, 8);
        let info = parse_symbol_entry(&buf).unwrap();
        assert_eq!(info.name, "MAIN.fSetpoint");
        assert_eq!(info.index_group, 0x4020);
        assert_eq!(info.index_offset, 0x10);
        assert_eq!(info.size, 8);
        assert_eq!(info.plc_type, PlcType::LReal);
        assert_eq!(info.array_size(), 1);
    }

    #[test]
    fn test_parse_array_symbol_entry() {
        let buf = entry("MAIN.array1", "ARRAY [0..199] OF REAL", 0x4020, 0x100, 800);
        let info = parse_symbol_entry(&buf).unwrap();
        assert_eq!(info.array_size(), 200);
        assert_eq!(info.size, 800);
    }

    #[test]
    fn test_parse_truncated_entry_fails() {
        let buf = entry("MAIN.x", "INT", 1, 2, 2);
        assert!(parse_symbol_entry(&buf[..20]).is_err());
        assert!(parse_symbol_entry(&buf[..SYMBOL_ENTRY_HEADER + 2]).is_err());
    }

    #[test]
    fn test_endpoint_format() {
        let conn = TcpAdsConnection::new(AdsClientConfig {
            host: "5.12.82.20".to_string(),
            ams_netid: [5, 12, 82, 20, 1, 1],
            ams_port: 851,
            timeout: Duration::from_secs(1),
        });
        assert_eq!(conn.endpoint(), "5.12.82.20.1.1:851");
        assert!(!conn.is_open());
    }

    #[test]
    fn test_calls_before_open_fail() {
        let conn = TcpAdsConnection::new(AdsClientConfig {
            host: "127.0.0.1".to_string(),
            ams_netid: [127, 0, 0, 1, 1, 1],
            ams_port: 851,
            timeout: Duration::from_millis(100),
        });
        let err = conn.read_state().unwrap_err();
        assert!(matches!(err, AdsError::ConnectionError(_)));
        // closing a never-opened connection is harmless
        conn.close().unwrap();
    }
}
