//! Little-endian encoding of PLC values
//!
//! TwinCAT stores all numeric data little-endian. Strings are NUL-terminated
//! byte buffers of fixed capacity.

use crate::error::{AdsError, Result};
use crate::plc::types::{PlcType, PlcValue};

/// Size of one `REAL` element
pub const REAL_SIZE: usize = 4;

fn fixed<const N: usize>(bytes: &[u8], ty: &PlcType) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            AdsError::data(format!(
                "{} needs {} bytes, got {}",
                ty,
                N,
                bytes.len()
            ))
        })
}

/// Decode a scalar value of type `ty` from PLC memory
pub fn decode(ty: &PlcType, bytes: &[u8]) -> Result<PlcValue> {
    let value = match ty {
        PlcType::Bool => PlcValue::Bool(fixed::<1>(bytes, ty)?[0] != 0),
        PlcType::Byte | PlcType::USInt => PlcValue::Int(i64::from(fixed::<1>(bytes, ty)?[0])),
        PlcType::SInt => PlcValue::Int(i64::from(i8::from_le_bytes(fixed(bytes, ty)?))),
        PlcType::Word | PlcType::UInt => {
            PlcValue::Int(i64::from(u16::from_le_bytes(fixed(bytes, ty)?)))
        },
        PlcType::Int => PlcValue::Int(i64::from(i16::from_le_bytes(fixed(bytes, ty)?))),
        PlcType::DWord | PlcType::UDInt => {
            PlcValue::Int(i64::from(u32::from_le_bytes(fixed(bytes, ty)?)))
        },
        PlcType::DInt => PlcValue::Int(i64::from(i32::from_le_bytes(fixed(bytes, ty)?))),
        PlcType::LWord | PlcType::ULInt => {
            let raw = u64::from_le_bytes(fixed(bytes, ty)?);
            let v = i64::try_from(raw)
                .map_err(|_| AdsError::data(format!("{} value {} exceeds int range", ty, raw)))?;
            PlcValue::Int(v)
        },
        PlcType::LInt => PlcValue::Int(i64::from_le_bytes(fixed(bytes, ty)?)),
        PlcType::Real => PlcValue::Real(f64::from(f32::from_le_bytes(fixed(bytes, ty)?))),
        PlcType::LReal => PlcValue::Real(f64::from_le_bytes(fixed(bytes, ty)?)),
        PlcType::String(_) => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            PlcValue::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
        },
        PlcType::Array { .. } | PlcType::Other(_) => {
            return Err(AdsError::data(format!("{} has no scalar codec", ty)));
        },
    };
    Ok(value)
}

fn integer_for(ty: &PlcType, value: &PlcValue) -> Result<i64> {
    let v = value.as_i64().ok_or_else(|| {
        AdsError::data(format!(
            "cannot convert {} '{}' to {}",
            value.type_name(),
            value,
            ty
        ))
    })?;
    if let Some((min, max)) = ty.integer_range() {
        let wide = i128::from(v);
        if wide < min || wide > max {
            return Err(AdsError::data(format!(
                "value {} out of range for {} [{}, {}]",
                v, ty, min, max
            )));
        }
    }
    Ok(v)
}

/// Encode `value` for a PLC location of type `ty`
pub fn encode(ty: &PlcType, value: &PlcValue) -> Result<Vec<u8>> {
    let bytes = match ty {
        PlcType::Bool => {
            let b = value.as_bool().ok_or_else(|| {
                AdsError::data(format!("cannot convert {} '{}' to BOOL", value.type_name(), value))
            })?;
            vec![u8::from(b)]
        },
        PlcType::Byte | PlcType::USInt => vec![integer_for(ty, value)? as u8],
        PlcType::SInt => (integer_for(ty, value)? as i8).to_le_bytes().to_vec(),
        PlcType::Word | PlcType::UInt => (integer_for(ty, value)? as u16).to_le_bytes().to_vec(),
        PlcType::Int => (integer_for(ty, value)? as i16).to_le_bytes().to_vec(),
        PlcType::DWord | PlcType::UDInt => {
            (integer_for(ty, value)? as u32).to_le_bytes().to_vec()
        },
        PlcType::DInt => (integer_for(ty, value)? as i32).to_le_bytes().to_vec(),
        PlcType::LWord | PlcType::ULInt => {
            (integer_for(ty, value)? as u64).to_le_bytes().to_vec()
        },
        PlcType::LInt => integer_for(ty, value)?.to_le_bytes().to_vec(),
        PlcType::Real | PlcType::LReal => {
            let f = value.as_f64().ok_or_else(|| {
                AdsError::data(format!("cannot convert {} '{}' to {}", value.type_name(), value, ty))
            })?;
            if *ty == PlcType::Real {
                (f as f32).to_le_bytes().to_vec()
            } else {
                f.to_le_bytes().to_vec()
            }
        },
        PlcType::String(capacity) => {
            let s = value.as_string();
            if s.len() > *capacity {
                return Err(AdsError::data(format!(
                    "string of {} bytes exceeds {}",
                    s.len(),
                    ty
                )));
            }
            let mut buf = vec![0u8; capacity + 1];
            buf[..s.len()].copy_from_slice(s.as_bytes());
            buf
        },
        PlcType::Array { .. } | PlcType::Other(_) => {
            return Err(AdsError::data(format!("{} has no scalar codec", ty)));
        },
    };
    Ok(bytes)
}

/// Decode consecutive `REAL` values
pub fn decode_reals(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(REAL_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian() {
        assert_eq!(
            decode(&PlcType::Int, &[0x18, 0xFC]).unwrap(),
            PlcValue::Int(-1000)
        );
        assert_eq!(
            decode(&PlcType::UDInt, &[0x78, 0x56, 0x34, 0x12]).unwrap(),
            PlcValue::Int(0x1234_5678)
        );
        assert_eq!(
            decode(&PlcType::Real, &1.5f32.to_le_bytes()).unwrap(),
            PlcValue::Real(1.5)
        );
        assert_eq!(decode(&PlcType::Bool, &[1]).unwrap(), PlcValue::Bool(true));
    }

    #[test]
    fn test_decode_short_buffer_fails() {
        let err = decode(&PlcType::DInt, &[1, 2]).unwrap_err();
        assert!(matches!(err, AdsError::DataError(_)));
    }

    #[test]
    fn test_decode_unsigned_64_limited_to_i64() {
        let max = (i64::MAX as u64).to_le_bytes();
        assert_eq!(
            decode(&PlcType::ULInt, &max).unwrap(),
            PlcValue::Int(i64::MAX)
        );

        let above = (i64::MAX as u64 + 1).to_le_bytes();
        let err = decode(&PlcType::LWord, &above).unwrap_err();
        assert!(matches!(err, AdsError::DataError(_)));
    }

    #[test]
    fn test_decode_string_stops_at_nul() {
        let bytes = b"hello\0garbage";
        assert_eq!(
            decode(&PlcType::String(12), bytes).unwrap(),
            PlcValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_encode_range_checked() {
        assert_eq!(
            encode(&PlcType::Int, &PlcValue::Int(-2)).unwrap(),
            vec![0xFE, 0xFF]
        );
        assert!(encode(&PlcType::SInt, &PlcValue::Int(200)).is_err());
        assert!(encode(&PlcType::UInt, &PlcValue::Int(-1)).is_err());
        assert!(encode(&PlcType::DInt, &PlcValue::Real(2.5)).is_err());
    }

    #[test]
    fn test_encode_string_padded() {
        let bytes = encode(&PlcType::String(4), &PlcValue::from("ab")).unwrap();
        assert_eq!(bytes, vec![b'a', b'b', 0, 0, 0]);
        assert!(encode(&PlcType::String(4), &PlcValue::from("abcdef")).is_err());
    }

    #[test]
    fn test_decode_reals_ignores_trailing_bytes() {
        let mut bytes = Vec::new();
        for v in [1.0f32, -2.5, 3.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(0xAA);
        assert_eq!(decode_reals(&bytes), vec![1.0, -2.5, 3.25]);
    }

    #[test]
    fn test_array_has_no_scalar_codec() {
        let ty = PlcType::parse("ARRAY [0..9] OF REAL").unwrap();
        assert!(decode(&ty, &[0; 40]).is_err());
    }
}
