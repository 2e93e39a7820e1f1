use crate::{DatabaseError, Result};
use alloy_primitives::{Address, U256};
use prospector_core::types::{PoolDetail, Protocol};
use sqlx::FromRow;

/// Database row for the pools table.
///
/// Reserves are stored as decimal strings so wei-scale integers survive
/// the round trip without precision loss.
#[derive(Debug, Clone, FromRow)]
pub struct DbPool {
    /// Pool address, hex with 0x prefix (primary key)
    pub id: String,
    pub protocol: String,
    pub token0: String,
    pub token1: String,
    /// Fee percentage
    pub fee: f64,
    pub reserve0: String,
    pub reserve1: String,
}

impl DbPool {
    pub fn from_detail(detail: &PoolDetail) -> Self {
        Self {
            id: detail.address.to_string(),
            protocol: detail.protocol.as_str().to_string(),
            token0: detail.token0.to_string(),
            token1: detail.token1.to_string(),
            fee: detail.fee,
            reserve0: detail.reserve0.to_string(),
            reserve1: detail.reserve1.to_string(),
        }
    }

    /// Map a row back to the domain type. Unparseable reserve strings
    /// degrade to zero; a malformed address or protocol tag is a corrupt
    /// row and surfaces as an error.
    pub fn into_detail(self) -> Result<PoolDetail> {
        let address = parse_address(&self.id, &self.id)?;
        let token0 = parse_address(&self.id, &self.token0)?;
        let token1 = parse_address(&self.id, &self.token1)?;
        let protocol: Protocol = self.protocol.parse().map_err(|message| {
            DatabaseError::CorruptRow {
                id: self.id.clone(),
                message,
            }
        })?;

        Ok(PoolDetail {
            address,
            token0,
            token1,
            fee: self.fee,
            protocol,
            reserve0: parse_reserve(&self.reserve0),
            reserve1: parse_reserve(&self.reserve1),
        })
    }
}

fn parse_address(id: &str, value: &str) -> Result<Address> {
    value.parse().map_err(|_| DatabaseError::CorruptRow {
        id: id.to_string(),
        message: format!("invalid address: {value}"),
    })
}

fn parse_reserve(value: &str) -> U256 {
    U256::from_str_radix(value, 10).unwrap_or(U256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn detail_round_trips_through_row() {
        let detail = PoolDetail {
            address: address!("000000000000000000000000000000000000dEaD"),
            token0: address!("0000000000000000000000000000000000000001"),
            token1: address!("0000000000000000000000000000000000000002"),
            fee: 0.30,
            protocol: Protocol::V2Like,
            reserve0: U256::from(10u64).pow(U256::from(20u64)),
            reserve1: U256::from(2u64) * U256::from(10u64).pow(U256::from(20u64)),
        };

        let row = DbPool::from_detail(&detail);
        assert_eq!(row.protocol, "UniswapV2LikeSwap");
        assert_eq!(row.reserve0, "100000000000000000000");

        let restored = row.into_detail().expect("row maps back");
        assert_eq!(restored, detail);
    }

    #[test]
    fn unparseable_reserves_degrade_to_zero() {
        assert_eq!(parse_reserve("not-a-number"), U256::ZERO);
        assert_eq!(parse_reserve(""), U256::ZERO);
        assert_eq!(parse_reserve("42"), U256::from(42u64));
    }

    #[test]
    fn corrupt_protocol_tag_is_an_error() {
        let row = DbPool {
            id: "0x000000000000000000000000000000000000dEaD".to_string(),
            protocol: "UniswapV9".to_string(),
            token0: "0x0000000000000000000000000000000000000001".to_string(),
            token1: "0x0000000000000000000000000000000000000002".to_string(),
            fee: 0.30,
            reserve0: "0".to_string(),
            reserve1: "0".to_string(),
        };
        assert!(row.into_detail().is_err());
    }
}
