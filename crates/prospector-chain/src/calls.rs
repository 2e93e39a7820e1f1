//! View-call helpers for pool inspection.
//!
//! Calldata is built from typed `sol!` function declarations; return data is
//! decoded tolerantly, because pools in the wild answer the same method with
//! several wire shapes (padded word, bare 20 bytes, narrow integers).

use crate::ChainReader;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use prospector_core::{ProspectorError, Result};

sol! {
    function token0() external view returns (address);
    function token1() external view returns (address);
    function tokenAddress() external view returns (address);
    function fee() external view returns (uint24);
    function getReserves() external view returns (uint112, uint112, uint32);
    function balanceOf(address owner) external view returns (uint256);
}

fn decode_error(address: Address, message: impl Into<String>) -> ProspectorError {
    ProspectorError::CallDecode {
        address,
        message: message.into(),
    }
}

/// Decode an address from return data, accepting either a full ABI word
/// (address right-aligned in 32 bytes) or a bare 20-byte value.
pub fn decode_address(address: Address, data: &[u8]) -> Result<Address> {
    match data.len() {
        n if n >= 32 => Ok(Address::from_slice(&data[12..32])),
        20 => Ok(Address::from_slice(data)),
        n => Err(decode_error(
            address,
            format!("expected address return, got {n} bytes"),
        )),
    }
}

/// Decode the unsigned integer in the `index`-th 32-byte return word.
/// Shorter-than-word payloads are accepted as big-endian integers.
pub fn decode_uint(address: Address, data: &[u8], index: usize) -> Result<U256> {
    let offset = index * 32;
    if data.len() >= offset + 32 {
        return Ok(U256::from_be_slice(&data[offset..offset + 32]));
    }
    if index == 0 && !data.is_empty() && data.len() < 32 {
        return Ok(U256::from_be_slice(data));
    }
    Err(decode_error(
        address,
        format!(
            "expected uint return word {index}, got {} bytes",
            data.len()
        ),
    ))
}

/// Resolve a token address through the named view method.
pub async fn token_address(
    client: &dyn ChainReader,
    pool: Address,
    method: &str,
) -> Result<Address> {
    let calldata: Bytes = match method {
        "token0" => token0Call {}.abi_encode().into(),
        "token1" => token1Call {}.abi_encode().into(),
        "tokenAddress" => tokenAddressCall {}.abi_encode().into(),
        other => {
            return Err(decode_error(
                pool,
                format!("unsupported token method {other}"),
            ))
        }
    };
    let data = client.call(pool, calldata).await?;
    decode_address(pool, &data)
}

/// Read the pool's fee. The contract answers in units of 1e-6; dividing by
/// 1e4 yields a percentage (3000 becomes 0.30).
pub async fn pool_fee(client: &dyn ChainReader, pool: Address) -> Result<f64> {
    let data = client.call(pool, feeCall {}.abi_encode().into()).await?;
    let raw = decode_uint(pool, &data, 0)?;
    let fee: u64 = raw
        .try_into()
        .map_err(|_| decode_error(pool, format!("fee value out of range: {raw}")))?;
    Ok(fee as f64 / 1e4)
}

/// Read a constant-product pair's reserves. The trailing
/// `blockTimestampLast` word is ignored.
pub async fn get_reserves(client: &dyn ChainReader, pool: Address) -> Result<(U256, U256)> {
    let data = client
        .call(pool, getReservesCall {}.abi_encode().into())
        .await?;
    let reserve0 = decode_uint(pool, &data, 0)?;
    let reserve1 = decode_uint(pool, &data, 1)?;
    Ok((reserve0, reserve1))
}

/// Standard ERC-20 balance read, used as the reserve proxy for
/// concentrated-liquidity pools.
pub async fn erc20_balance_of(
    client: &dyn ChainReader,
    token: Address,
    owner: Address,
) -> Result<U256> {
    let data = client
        .call(token, balanceOfCall { owner }.abi_encode().into())
        .await?;
    decode_uint(token, &data, 0)
}
