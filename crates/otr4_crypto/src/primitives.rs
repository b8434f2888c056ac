//! Scalar, point, and MPI wrappers plus the secret newtypes that carry
//! zeroization and constant-time equality through the rest of the crate.

use ed448_goldilocks::elliptic_curve::Group;
use ed448_goldilocks::{
    CompressedEdwardsY, EdwardsPoint, EdwardsScalar as GoldilocksScalar, EdwardsScalarBytes,
};
use num_bigint::BigUint;
use num_traits::Zero;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Otr4Error, Result};

pub const SCALAR_LEN: usize = 56;
pub const POINT_LEN: usize = 57;

/// An element of the Edwards-448 scalar field.
#[derive(Clone)]
pub struct Scalar(pub(crate) GoldilocksScalar);

impl Scalar {
    pub fn random(rng: &mut impl rand_core::RngCore) -> Self {
        Scalar(GoldilocksScalar::from_bytes_mod_order_wide(&random_wide(rng)))
    }

    /// Deserialize a 56-byte little-endian scalar, rejecting values at or
    /// above the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_LEN {
            return Err(Otr4Error::Malformed(format!(
                "scalar must be {SCALAR_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut scalar_bytes = EdwardsScalarBytes::default();
        scalar_bytes[..SCALAR_LEN].copy_from_slice(bytes);
        Option::<GoldilocksScalar>::from(GoldilocksScalar::from_canonical_bytes(&scalar_bytes))
            .map(Scalar)
            .ok_or_else(|| Otr4Error::Malformed("scalar is not canonically reduced".into()))
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_LEN] {
        let bytes = self.0.to_bytes();
        let mut out = [0u8; SCALAR_LEN];
        out.copy_from_slice(&bytes);
        out
    }

    pub fn mul_base(&self) -> Point {
        Point(EdwardsPoint::GENERATOR * self.0)
    }
}

impl core::ops::Add for &Scalar {
    type Output = Scalar;
    fn add(self, rhs: &Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}

impl core::ops::Sub for &Scalar {
    type Output = Scalar;
    fn sub(self, rhs: &Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}

impl core::ops::Mul for &Scalar {
    type Output = Scalar;
    fn mul(self, rhs: &Scalar) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.to_bytes()[..].ct_eq(&other.to_bytes()[..])
    }
}

/// A point on the Edwards-448 curve, required to be in the prime-order
/// subgroup on deserialization.
#[derive(Clone)]
pub struct Point(pub(crate) EdwardsPoint);

impl Point {
    pub fn generator() -> Self {
        Point(EdwardsPoint::GENERATOR)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != POINT_LEN {
            return Err(Otr4Error::Malformed(format!(
                "point must be {POINT_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut buf = [0u8; POINT_LEN];
        buf.copy_from_slice(bytes);
        let compressed = CompressedEdwardsY(buf);
        let point = Option::<ed448_goldilocks::AffinePoint>::from(compressed.decompress())
            .map(|p| p.to_edwards())
            .ok_or_else(|| Otr4Error::Malformed("point is not a valid curve encoding".into()))?;
        if bool::from(Group::is_identity(&point)) {
            return Err(Otr4Error::Malformed(
                "point at infinity is not in the prime-order subgroup".into(),
            ));
        }
        Ok(Point(point))
    }

    pub fn to_bytes(&self) -> [u8; POINT_LEN] {
        self.0.to_affine().compress().0
    }

    pub fn mul(&self, scalar: &Scalar) -> Point {
        Point(self.0 * scalar.0)
    }
}

impl core::ops::Add for &Point {
    type Output = Point;
    fn add(self, rhs: &Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

impl core::ops::Sub for &Point {
    type Output = Point;
    fn sub(self, rhs: &Point) -> Point {
        Point(self.0 - rhs.0)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// A big-endian unsigned integer used for DH-3072 contributions.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Mpi(pub BigUint);

impl Mpi {
    pub fn zero() -> Self {
        Mpi(BigUint::zero())
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Mpi(BigUint::from_bytes_be(bytes))
    }

    /// Minimal big-endian encoding; zero encodes as an empty slice.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        if self.0.is_zero() {
            Vec::new()
        } else {
            self.0.to_bytes_be()
        }
    }
}

fn random_wide(rng: &mut impl rand_core::RngCore) -> ed448_goldilocks::WideEdwardsScalarBytes {
    let mut out = ed448_goldilocks::WideEdwardsScalarBytes::default();
    rng.fill_bytes(&mut out);
    out
}

macro_rules! secret_newtype {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn zero() -> Self {
                $name([0u8; $len])
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                if bytes.len() != $len {
                    return Err(Otr4Error::Malformed(format!(
                        concat!(stringify!($name), " must be {} bytes, got {}"),
                        $len,
                        bytes.len()
                    )));
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok($name(out))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                bool::from(self.0[..].ct_eq(&[0u8; $len][..]))
            }
        }

        impl ConstantTimeEq for $name {
            fn ct_eq(&self, other: &Self) -> subtle::Choice {
                self.0[..].ct_eq(&other.0[..])
            }
        }
    };
}

secret_newtype!(ChainKey, 64);
secret_newtype!(RootKey, 64);
secret_newtype!(SharedSecret, 64);
secret_newtype!(BraceKey, 32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpi_zero_is_empty() {
        assert!(Mpi::zero().to_bytes_be().is_empty());
    }

    #[test]
    fn mpi_roundtrip() {
        let m = Mpi::from_bytes_be(&[0x01, 0x02, 0x03]);
        assert_eq!(Mpi::from_bytes_be(&m.to_bytes_be()), m);
    }

    #[test]
    fn chain_key_zero_detection() {
        let zeroed = ChainKey::zero();
        assert!(zeroed.is_zero());
        let nonzero = ChainKey::from_slice(&[1u8; 64]).unwrap();
        assert!(!nonzero.is_zero());
    }
}
